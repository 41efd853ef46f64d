// tests/poller.rs

//! Dispatch behaviour of the default epoll poller: edge-triggered events,
//! one-shot re-arming, and unregistration.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dagflow::{Epoll, Event, FdCallback, FdMode, Poller};
use dagflow_test_utils::pipe::Pipe;

use crate::common::init_tracing;

const TICK: Option<Duration> = Some(Duration::from_millis(50));

#[test]
fn edge_triggered_event_dispatches_once_per_token() {
    init_tracing();
    let epoll = Epoll::new().unwrap();
    let event = Arc::new(Event::new().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let callback: FdCallback = {
        let event = Arc::clone(&event);
        let hits = Arc::clone(&hits);
        Arc::new(move |_fd| {
            hits.fetch_add(1, Ordering::Relaxed);
            event.get()?;
            Ok(())
        })
    };
    epoll
        .add_fd(event.fd(), callback, FdMode::EdgeTriggered, "token")
        .unwrap();

    event.put(1).unwrap();
    assert!(epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 1);

    // Consumed: nothing further to dispatch.
    assert!(!epoll.wait_and_dispatch(TICK).unwrap());

    event.put(1).unwrap();
    assert!(epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 2);

    epoll.rm_fd(event.fd(), true).unwrap();
}

#[test]
fn one_shot_fd_stays_quiet_until_rearmed() {
    init_tracing();
    let epoll = Arc::new(Epoll::new().unwrap());
    let pipe = Pipe::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let callback: FdCallback = {
        let hits = Arc::clone(&hits);
        Arc::new(move |fd| {
            hits.fetch_add(1, Ordering::Relaxed);
            let mut byte = [0u8; 1];
            unsafe { libc::read(fd, byte.as_mut_ptr().cast(), 1) };
            Ok(())
        })
    };
    epoll
        .add_fd(pipe.read_fd(), callback, FdMode::OneShot, "input")
        .unwrap();

    pipe.notify().unwrap();
    pipe.notify().unwrap();
    assert!(epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 1);

    // Disarmed after the shot, despite a byte still being buffered.
    assert!(!epoll.wait_and_dispatch(TICK).unwrap());

    epoll.mod_fd(pipe.read_fd(), FdMode::OneShot).unwrap();
    assert!(epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 2);

    epoll.rm_fd(pipe.read_fd(), true).unwrap();
}

#[test]
fn disarmed_registration_never_fires() {
    init_tracing();
    let epoll = Epoll::new().unwrap();
    let pipe = Pipe::new().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let callback: FdCallback = {
        let hits = Arc::clone(&hits);
        Arc::new(move |_fd| {
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    };
    epoll
        .add_fd(pipe.read_fd(), callback, FdMode::Disarmed, "input")
        .unwrap();

    pipe.notify().unwrap();
    assert!(!epoll.wait_and_dispatch(TICK).unwrap());

    epoll.mod_fd(pipe.read_fd(), FdMode::OneShot).unwrap();
    assert!(epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 1);

    epoll.rm_fd(pipe.read_fd(), true).unwrap();
}

#[test]
fn removed_fd_no_longer_dispatches() {
    init_tracing();
    let epoll = Epoll::new().unwrap();
    let event = Arc::new(Event::new().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let callback: FdCallback = {
        let hits = Arc::clone(&hits);
        Arc::new(move |_fd| {
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    };
    epoll
        .add_fd(event.fd(), callback, FdMode::EdgeTriggered, "token")
        .unwrap();
    epoll.rm_fd(event.fd(), true).unwrap();

    event.put(1).unwrap();
    assert!(!epoll.wait_and_dispatch(TICK).unwrap());
    assert_eq!(hits.load(Ordering::Relaxed), 0);

    // Removing twice is tolerated.
    epoll.rm_fd(event.fd(), false).unwrap();
}
