use crate::{args, Actor, Error};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};


/// Multi-threaded runtime so handlers that block cannot starve test timers.
fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime should build")
}

#[test]
fn cast_of_unregistered_event_is_rejected() {
    runtime().block_on(async {
        let actor: Actor<u32> = Actor::new();
        let err = actor.cast(0, args![]).await.unwrap_err();
        assert_eq!(err, Error::NotRegistered(0));
        actor.close().await;
    });
}

#[test]
fn register_requires_a_handler() {
    runtime().block_on(async {
        let actor: Actor<u32> = Actor::new();

        let err = actor.register_handler(0, None).await.unwrap_err();
        assert_eq!(err, Error::InvalidHandler);

        // The failed registration left the event unbound.
        let err = actor.cast(0, args![]).await.unwrap_err();
        assert_eq!(err, Error::NotRegistered(0));

        actor.register(0, |_| {}).await.expect("register failed");
        let err = actor.register(0, |_| {}).await.unwrap_err();
        assert_eq!(err, Error::AlreadyRegistered(0));

        actor.close().await;
    });
}

#[test]
fn registration_is_safe_while_casting() {
    runtime().block_on(async {
        let actor: Actor<u32> = Actor::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        actor
            .register(0, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .expect("register failed");

        // Registrations of new events race a steady stream of casts; neither
        // side may block or fail the other.
        let caster = {
            let actor = actor.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    actor.cast(0, args![]).await.expect("cast failed");
                }
            })
        };
        for event in 1..=50 {
            actor.register(event, |_| {}).await.expect("register failed");
        }
        caster.await.expect("caster panicked");

        // Events registered mid-stream are immediately castable.
        actor.cast(25, args![]).await.expect("cast failed");

        actor.close().await;
        assert_eq!(hits.load(Ordering::SeqCst), 50);
    });
}

#[test]
fn duplicate_registration_keeps_original_handler() {
    runtime().block_on(async {
        let actor: Actor<u32> = Actor::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        actor
            .register(7, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .expect("register failed");

        let err = actor
            .register(7, |_| {
                panic!("replacement handler must never be invoked");
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::AlreadyRegistered(7));

        actor.cast(7, args![]).await.expect("cast failed");
        actor.close().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    });
}
