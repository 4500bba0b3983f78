use futures::StreamExt;
use tokio_pingpong::actor_system::{ActorSystem, EventBus};
use tokio_pingpong::config::ExchangeConfig;
use tokio_pingpong::exchange::{CoinFlip, Tally, run_exchange};
use tokio_pingpong::types::ExchangeEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ExchangeConfig::from_env();
    log::debug!("Configuration: {:?}", config);

    let bus = EventBus::<ExchangeEvent>::new(config.event_capacity);
    let system = ActorSystem::new("pingpong", bus);

    let mut events = system.event_stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => log::debug!("Event: {:?}", event),
                Err(error) => log::warn!("Event stream lagged: {}", error),
            }
        }
    });

    log::info!(
        "System '{}' running {} exchange(s): timeout {:?}, reply threshold {:.2}",
        system.name(),
        config.rounds,
        config.timeout,
        config.reply_threshold
    );

    let mut tally = Tally::default();
    for round in 1..=config.rounds {
        let policy = Box::new(CoinFlip::new(config.reply_threshold));
        let report = run_exchange(&system, &config, policy).await?;
        tally.record(&report);

        if config.report_json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            log::info!(
                "Round {}: request {} -> {} in {}ms",
                round,
                report.request_id,
                report.outcome,
                report.elapsed_ms
            );
        }
    }

    if config.report_json {
        println!("{}", serde_json::to_string(&tally)?);
    } else {
        log::info!(
            "Done: {} success(es), {} timeout(s)",
            tally.successes,
            tally.timeouts
        );
    }

    Ok(())
}
