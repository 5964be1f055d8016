use std::time::Duration;
use reqgate::{GateConfig, Interceptor, RequestDescriptor, Response};

/// Simulated transport: bulk routes are slow, everything else is quick.
async fn simulated_fetch(request: RequestDescriptor) -> std::io::Result<Response> {
    let delay = if request.url().contains("action_route=Get") {
        Duration::from_millis(120)
    } else {
        Duration::from_millis(40)
    };
    tokio::time::sleep(delay).await;
    Ok(Response::new(200, request.url().as_bytes().to_vec()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => GateConfig::load(path)?,
        None => GateConfig {
            debug: true,
            ..GateConfig::default()
        },
    };

    let level = if config.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let gate = Interceptor::spawn(config, simulated_fetch)?;

    let mut handles = Vec::new();
    for i in 0..10 {
        let url = format!(
            "https://maps.local/action?action_route=GetLayerTile&z=12&x={}&y=7",
            i
        );
        handles.push(gate.submit(RequestDescriptor::new(url)));
    }
    for i in 0..4 {
        let url = format!("https://maps.local/action?action_route=GetMapLayers&id={}", i);
        handles.push(gate.submit(RequestDescriptor::new(url)));
    }
    handles.push(gate.submit(RequestDescriptor::new("http://legacy.example.com/wms?layers=base")));

    println!("after submit: {}", serde_json::to_string(&gate.stats().await?)?);

    let mut ticker = tokio::time::interval(Duration::from_millis(60));
    loop {
        ticker.tick().await;
        let stats = gate.stats().await?;
        println!("timeline: {}", serde_json::to_string(&stats)?);
        if stats.high_in_flight == 0 && stats.low_in_flight == 0 && stats.queued == 0 {
            break;
        }
    }

    let mut ok = 0;
    for handle in handles {
        let class = handle.class();
        match handle.await {
            Ok(response) => {
                ok += 1;
                tracing::info!("{:?} settled: {} ({} bytes)", class, response.status, response.body.len());
            }
            Err(e) => tracing::warn!("{:?} failed: {}", class, e),
        }
    }
    println!("{} requests settled successfully", ok);

    gate.shutdown();
    Ok(())
}
