use proptest::prelude::*;
use relaydb_core::{
    ConnectionError, ConnectionExt, ConnectionFactory, ConnectionManager, ConnectionResult,
    DriverFactory, ErrorKind, Instance, Registry, StaticConnection,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// 先休眠再构造的工厂,用于观察并发行为
#[derive(Clone)]
struct SlowFactory {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl SlowFactory {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ConnectionFactory for SlowFactory {
    fn create(&self, config: &Value) -> ConnectionResult<Instance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        StaticConnection::from_config(config).map(Instance::connection)
    }
}

fn replicated_registry() -> Registry {
    Registry::new([(
        "default",
        json!({"master": {"dsn": "pgsql:host=primary"}, "slave": {"dsn": "pgsql:host=replica"}}),
    )])
}

#[test]
fn test_concurrent_get_master_single_construction() {
    let factory = SlowFactory::new(Duration::from_millis(100));
    let manager = ConnectionManager::new(replicated_registry(), factory.clone());
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.get_master(None).unwrap()
            })
        })
        .collect();

    let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    assert!(conns.iter().all(|c| Arc::ptr_eq(c, &conns[0])));
}

#[test]
fn test_concurrent_get_and_get_slave() {
    let factory = SlowFactory::new(Duration::from_millis(50));
    let manager = ConnectionManager::new(replicated_registry(), factory.clone());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    manager.get(None).unwrap()
                } else {
                    manager.get_slave(None).unwrap()
                }
            })
        })
        .collect();

    let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(conns.iter().all(|c| Arc::ptr_eq(c, &conns[0])));
    assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_failure_replayed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let factory = {
        let calls = calls.clone();
        move |_: &Value| -> ConnectionResult<Instance> {
            calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Err(ConnectionError::factory(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "replica unreachable",
            )))
        }
    };
    let manager = ConnectionManager::new(replicated_registry(), factory);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || manager.get_slave(None).err().unwrap())
        })
        .collect();

    for handle in handles {
        let err = handle.join().unwrap();
        assert_eq!(err.kind(), ErrorKind::Factory);
        assert_eq!(err.to_string(), "replica unreachable");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lazy_master_races_with_drop() {
    let manager = ConnectionManager::new(
        replicated_registry(),
        DriverFactory::with_static_drivers(["pgsql"]),
    );
    let slave = manager.get_slave(None).unwrap();

    let resolver = {
        let slave = slave.clone();
        thread::spawn(move || {
            (0..100)
                .map(|_| slave.master().map(|m| m.dsn()))
                .collect::<Vec<_>>()
        })
    };
    drop(manager);

    for result in resolver.join().unwrap() {
        match result {
            Ok(dsn) => assert_eq!(dsn, "pgsql:host=primary"),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Lifecycle),
        }
    }

    let err = slave.master().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
}

#[test]
fn test_scenario_master_only() {
    let manager = ConnectionManager::new(
        Registry::new([("default", json!({"master": {"dsn": "sqlite:a.db"}}))]),
        DriverFactory::with_static_drivers(["sqlite"]),
    );

    let conn = manager.get(None).unwrap();
    assert_eq!(conn.dsn(), "sqlite:a.db");
    assert!(conn.is_master());
    assert!(Arc::ptr_eq(&conn, &manager.get_master(None).unwrap()));
    assert_eq!(
        manager.get_slave(None).err().unwrap().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn test_scenario_master_and_slave() {
    let manager = ConnectionManager::new(
        replicated_registry(),
        DriverFactory::with_static_drivers(["pgsql"]),
    );

    let conn = manager.get(None).unwrap();
    assert_eq!(conn.dsn(), "pgsql:host=replica");
    let master = conn.master().unwrap();
    assert_eq!(master.dsn(), "pgsql:host=primary");
    assert!(Arc::ptr_eq(&master, &manager.get_master(None).unwrap()));
}

proptest! {
    #[test]
    fn prop_unknown_ids_are_config_errors(id in "[a-z_]{1,12}") {
        prop_assume!(id != "default");

        let factory = SlowFactory::new(Duration::ZERO);
        let manager = ConnectionManager::new(replicated_registry(), factory.clone());

        let results = [
            manager.get(Some(&id)),
            manager.get_master(Some(&id)),
            manager.get_slave(Some(&id)),
            manager.create(Some(&id)),
            manager.create_master(Some(&id)),
            manager.create_slave(Some(&id)),
        ];
        for result in results {
            let kind = result.err().map(|e| e.kind());
            prop_assert_eq!(kind, Some(ErrorKind::Config));
        }
        prop_assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
    }
}
