//! Human-readable report of a serialized batch list.
//!
//! Every batch and transaction is decoded, verified, and rendered as JSON.
//! A verification failure is reported in the output rather than aborting,
//! so a broken list can still be examined.

use serde_json::{json, Map, Value};

use sawmill_protocol::batch::{decode_batch_list, verify_batch};
use sawmill_protocol::messages::{Batch, Transaction};
use sawmill_protocol::payload::{Payload, PayloadValue};
use sawmill_protocol::transaction::verify_transaction;

/// Decodes `bytes` and renders the report.
pub fn inspect(bytes: &[u8]) -> anyhow::Result<Value> {
    let list = decode_batch_list(bytes)?;
    let batches: Vec<Value> = list.batches.iter().map(render_batch).collect();
    Ok(json!({
        "bytes": bytes.len(),
        "batches": batches,
    }))
}

fn render_batch(batch: &Batch) -> Value {
    let (signer, listed) = match batch.decode_header() {
        Ok(header) => (Value::from(header.signer_public_key), Value::from(header.transaction_ids)),
        Err(_) => (Value::Null, Value::Null),
    };
    let transactions: Vec<Value> = batch.transactions.iter().map(render_transaction).collect();

    json!({
        "batch_id": batch.id(),
        "signer_public_key": signer,
        "transaction_ids": listed,
        "trace": batch.trace,
        "valid": verdict(verify_batch(batch).map(|_| ())),
        "transactions": transactions,
    })
}

fn render_transaction(txn: &Transaction) -> Value {
    let mut out = Map::new();
    out.insert("transaction_id".into(), txn.id().into());

    if let Ok(header) = txn.decode_header() {
        out.insert("family_name".into(), header.family_name.into());
        out.insert("family_version".into(), header.family_version.into());
        out.insert("inputs".into(), header.inputs.into());
        out.insert("outputs".into(), header.outputs.into());
        out.insert("dependencies".into(), header.dependencies.into());
        if !header.nonce.is_empty() {
            out.insert("nonce".into(), header.nonce.into());
        }
        out.insert("signer_public_key".into(), header.signer_public_key.into());
        out.insert("batcher_public_key".into(), header.batcher_public_key.into());
    }

    let payload = match Payload::decode(&txn.payload) {
        Ok(payload) => payload_to_json(&payload),
        Err(_) => Value::from(hex::encode(&txn.payload)),
    };
    out.insert("payload".into(), payload);
    out.insert("valid".into(), verdict(verify_transaction(txn).map(|_| ())));
    Value::Object(out)
}

fn verdict<E: std::fmt::Display>(result: Result<(), E>) -> Value {
    match result {
        Ok(()) => Value::Bool(true),
        Err(e) => Value::String(e.to_string()),
    }
}

fn payload_to_json(payload: &Payload) -> Value {
    let fields = payload
        .iter()
        .map(|(key, value)| {
            let value = match value {
                PayloadValue::Text(s) => Value::from(s.as_str()),
                PayloadValue::Integer(i) => Value::from(*i),
                PayloadValue::Bool(b) => Value::from(*b),
                PayloadValue::Float(x) => Value::from(*x),
                PayloadValue::Bytes(_) => Value::from(value.to_string()),
            };
            (key.to_string(), value)
        })
        .collect::<Map<String, Value>>();
    Value::Object(fields)
}
