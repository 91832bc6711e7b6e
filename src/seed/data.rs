use crate::model::InstanceId;
use crate::store::PayloadCache;
use serde_json::{json, Value};

/// Settings payloads for three demo environments
pub fn demo_settings() -> Vec<(InstanceId, Value)> {
    vec![
        (
            "dev".to_string(),
            json!({
                "database": {"host": "localhost", "pool": {"min": 2, "max": 5}},
                "features": {"newCheckout": true, "darkMode": true},
                "logging": {"level": "debug"},
                "allowedOrigins": ["http://localhost:3000"]
            }),
        ),
        (
            "staging".to_string(),
            json!({
                "database": {"host": "db.staging.internal", "pool": {"min": 2, "max": 20}},
                "features": {"newCheckout": true, "darkMode": false},
                "logging": {"level": "info"},
                "allowedOrigins": ["https://staging.example.com"]
            }),
        ),
        (
            "prod".to_string(),
            json!({
                "database": {"host": "db.prod.internal", "pool": {"min": 2, "max": 20}},
                "features": {"darkMode": false},
                "logging": {"level": "info", "sampling": 0.1},
                "allowedOrigins": ["https://example.com"]
            }),
        ),
    ]
}

/// Put the demo payloads into the cache
pub async fn load_seed_data(cache: &PayloadCache) {
    let payloads = demo_settings();
    let count = payloads.len();
    for (instance_id, payload) in payloads {
        cache.put(&instance_id, payload).await;
    }
    log::info!("Loaded {} demo payloads", count);
}
