use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use klock_core::{KeyedLock, LockError};
use klock_model::LockOptions;
use klock_observe::init_logger;
use klock_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

mod settings;
use settings::Settings;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) settings + logger
    let settings = Settings::load()?;
    init_logger(&settings.observe)?;
    info!("logger initialized");

    // 2) lock with prometheus metrics
    let metrics = PrometheusMetrics::new()?;
    let lock = KeyedLock::new(settings.lock)?.with_metrics(Arc::new(metrics.clone()));
    info!(config = ?lock.config(), "lock ready");

    // 3) contended writes to one ledger, independent audit key
    let writes: Vec<_> = (1..=3)
        .map(|n| {
            lock.submit(
                "ledger",
                move || async move {
                    sleep(Duration::from_millis(50)).await;
                    Ok::<_, anyhow::Error>(n * 100)
                },
                LockOptions::default(),
            )
        })
        .collect();
    let audit = lock.submit(
        "audit",
        || async { Ok::<_, anyhow::Error>("audit done") },
        LockOptions::default(),
    );
    info!(pending = lock.pending("ledger"), "ledger writes queued");

    info!(result = %audit.await?, "audit finished without waiting for ledger");
    for w in writes {
        let key = w.key().to_owned();
        info!(key = %key, balance = w.await?, "ledger write applied");
    }

    // 4) impatient caller behind a slow holder
    let slow = lock.submit(
        "report",
        || async {
            sleep(Duration::from_millis(200)).await;
            Ok::<_, anyhow::Error>(())
        },
        LockOptions::default(),
    );
    let impatient = lock
        .acquire(
            "report",
            || async { Ok::<_, anyhow::Error>(()) },
            LockOptions::default().with_wait_timeout(20),
        )
        .await;
    if let Err(e @ LockError::WaitTimeout { .. }) = &impatient {
        warn!(error = %e, "report request gave up");
    }
    slow.await?;

    // 5) hung operation is cut off and the key moves on
    let hung = lock.submit(
        "device",
        || std::future::pending::<Result<(), anyhow::Error>>(),
        LockOptions::default().with_run_timeout(100),
    );
    let next = lock.submit(
        "device",
        || async { Ok::<_, anyhow::Error>("device ready") },
        LockOptions::default(),
    );
    if let Err(e) = hung.await {
        warn!(error = %e, "device call abandoned");
    }
    info!(result = %next.await?, "device key recovered");

    // 6) locked method
    let rename = lock.lock_method(
        "fs",
        |(from, to): (String, String)| async move {
            if from == to {
                anyhow::bail!("source and target are the same: {from}");
            }
            Ok(format!("{from} -> {to}"))
        },
        LockOptions::default(),
    );
    let renamed = rename
        .call(("a.txt".to_string(), "b.txt".to_string()))
        .await?;
    info!(result = %renamed, "renamed");
    if let Err(e) = rename.call(("c.txt".to_string(), "c.txt".to_string())).await {
        warn!(error = %e, "rename rejected");
    }

    // 7) metrics dump
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
    println!("{}", String::from_utf8_lossy(&buffer));

    info!(held = lock.held_keys(), "done");
    Ok(())
}
