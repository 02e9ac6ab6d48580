use lazy_static::lazy_static;
use prometheus_exporter::prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec, IntGauge,
};

use crate::error::{ScriptError, ScriptResult, TransferError, TransferResult};

lazy_static! {
    pub static ref TRANSFERS: IntCounterVec = register_int_counter_vec!(
        "calypso_transfers_total",
        "Script transfers, by how they ended.",
        &["result"]
    )
    .unwrap();
    pub static ref RECEIVED_BYTES: IntCounter = register_int_counter!(
        "calypso_received_bytes_total",
        "Script bytes written to disk by the receiver."
    )
    .unwrap();
    pub static ref SCRIPT_LOADS: IntCounterVec = register_int_counter_vec!(
        "calypso_script_loads_total",
        "Script load attempts, by result.",
        &["result"]
    )
    .unwrap();
    pub static ref REPLAYS_STARTED: IntCounter = register_int_counter!(
        "calypso_replays_started_total",
        "Number of replays started."
    )
    .unwrap();
    pub static ref REPLAYED_FRAMES: IntCounter = register_int_counter!(
        "calypso_replayed_frames_total",
        "Frames of input handed to the game."
    )
    .unwrap();
    pub static ref REPLAY_ACTIVE: IntGauge = register_int_gauge!(
        "calypso_replay_active",
        "1 while a replay is running."
    )
    .unwrap();
}

pub fn inc_transfers<T>(res: &TransferResult<T>) {
    let label = match res {
        Ok(..) => "Success",
        Err(e) => match e {
            TransferError::NoData => "Empty connection",
            TransferError::BadData(..) => "Bad data",
            TransferError::Timeout => "Timeout",
            TransferError::IO { .. } => "I/O error",
        },
    };
    TRANSFERS.with_label_values(&[label]).inc();
}

pub fn inc_script_loads<T>(res: &ScriptResult<T>) {
    let label = match res {
        Ok(..) => "Success",
        Err(e) => match e {
            ScriptError::IO { .. } => "I/O error",
            ScriptError::EofReached { .. } => "Truncated",
            ScriptError::SignatureMismatch => "Not a script",
            ScriptError::InvalidTitleId(..) | ScriptError::UnsupportedVersion { .. } => "Unsupported",
            _ => "Bad data",
        },
    };
    SCRIPT_LOADS.with_label_values(&[label]).inc();
}
