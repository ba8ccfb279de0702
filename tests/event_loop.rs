use splaysched::{Clock, Delta, Error, ManualClock, Scheduler, Time};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Ping(u32),
    Timeout(u32),
}

// Drives the scheduler the way a daemon's main loop would: once per iteration, harvest
// everything that is due before going back to waiting.
fn tick(sched: &mut Scheduler<Job>, clock: &ManualClock) -> Vec<Job> {
    let mut fired = Vec::new();
    while let Some(ev) = sched.pop_expired_with(clock) {
        fired.push(ev.into_payload());
    }
    fired
}

#[test]
fn loop_harvests_due_events_each_iteration() {
    init_tracing();
    let clock = ManualClock::new(Time::new(1_000));
    let mut sched = Scheduler::new();

    sched.schedule(clock.now() + Delta::new(10), Job::Ping(1));
    let timeout = sched.schedule(clock.now() + Delta::new(30), Job::Timeout(1));
    sched.schedule(clock.now() + Delta::new(10), Job::Ping(2));
    sched.schedule(clock.now() + Delta::new(20), Job::Ping(3));

    assert!(tick(&mut sched, &clock).is_empty());

    clock.advance(Delta::new(11));
    assert_eq!(tick(&mut sched, &clock), vec![Job::Ping(1), Job::Ping(2)]);

    // The peer answered; the timeout is withdrawn before it fires.
    assert_eq!(sched.cancel(timeout).map(|ev| ev.payload).ok(), Some(Job::Timeout(1)));

    clock.advance(Delta::new(100));
    assert_eq!(tick(&mut sched, &clock), vec![Job::Ping(3)]);
    assert!(sched.is_empty());
    assert_eq!(sched.shutdown(), 0);
}

#[test]
fn clock_jump_backwards_is_caught_up_by_flush() -> anyhow::Result<()> {
    init_tracing();
    let clock = ManualClock::new(Time::new(50_000));
    let mut sched = Scheduler::new();
    for (i, delay) in [5, 60, 3_600].into_iter().enumerate() {
        sched.schedule(clock.now() + Delta::new(delay), Job::Ping(i as u32));
    }

    // Wall clock stepped back by a day; without a flush nothing would fire for a long time.
    clock.set(Time::new(50_000 - 86_400));
    assert!(tick(&mut sched, &clock).is_empty());

    let shift = sched.flush_with(&clock)?;
    assert_eq!(shift, Some(Delta::new(3_600 + 86_400 + 1)));
    assert_eq!(sched.peek_deadline(), Some(clock.now() - Delta::new(3_596)));

    assert_eq!(
        tick(&mut sched, &clock),
        vec![Job::Ping(0), Job::Ping(1), Job::Ping(2)]
    );
    assert_eq!(sched.flush_with(&clock)?, None);
    Ok(())
}

#[test]
fn cancelling_a_fired_event_is_an_error() {
    init_tracing();
    let mut sched = Scheduler::new();
    let id = sched.schedule(Time::new(1), Job::Ping(9));
    let fired: Vec<_> = sched
        .drain_expired(Time::new(2))
        .into_iter()
        .map(|ev| ev.into_parts())
        .collect();
    assert_eq!(fired, vec![(Time::new(1), Job::Ping(9))]);
    assert!(matches!(sched.cancel(id), Err(Error::NotMember(_))));
}
