use serde_json::Value;
use std::collections::HashMap;

use crate::error::CompareError;
use crate::logic::canonical::fingerprint;
use crate::logic::compare::ComparisonEngine;
use crate::model::{
    generate_id, now_rfc3339, ComparisonOutcome, ComparisonSession, InstanceId, NewComparison,
};

pub struct SessionAssembler;

impl SessionAssembler {
    /// Run a comparison and wrap its outcome into a new session.
    ///
    /// Validation failures return before anything is assembled.
    pub fn run(
        payloads: &HashMap<InstanceId, Value>,
        request: NewComparison,
    ) -> Result<ComparisonSession, CompareError> {
        let outcome = ComparisonEngine::run_comparison(
            payloads,
            &request.instance_ids,
            &request.mode,
            request.base_instance_id.as_deref(),
        )?;
        Ok(Self::assemble(payloads, request, outcome))
    }

    pub fn assemble(
        payloads: &HashMap<InstanceId, Value>,
        request: NewComparison,
        outcome: ComparisonOutcome,
    ) -> ComparisonSession {
        let timestamp = now_rfc3339();
        let name = request
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{} comparison {}", request.mode.label(), timestamp));

        let payload_fingerprints = request
            .instance_ids
            .iter()
            .map(|id| (id.clone(), payloads.get(id).map(fingerprint)))
            .collect();

        let session = ComparisonSession {
            id: generate_id(),
            name,
            instance_ids: request.instance_ids,
            endpoint: request.endpoint,
            mode: request.mode,
            base_instance_id: request.base_instance_id,
            timestamp,
            results: outcome.results,
            summary: outcome.summary,
            payload_fingerprints,
        };

        log::info!(
            "Assembled session '{}' ({}) with {} differences",
            session.name,
            session.id,
            session.summary.total_differences
        );
        session
    }
}
