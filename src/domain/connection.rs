// Connection liveness domain model

/// Liveness of the sensor link, as reported by the backend or inferred
/// from transport events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Transport is up but the backend has no sensor data yet.
    Waiting,
    Streaming,
    Buffering,
    Retransmitting,
    WarmingUp,
}

impl ConnectionState {
    /// Map the `state` field of an inbound message.
    ///
    /// Both backend waiting variants collapse to [`ConnectionState::Waiting`].
    /// A successful message without a `state` field means data is flowing, so
    /// the absence (and any unrecognized value) defaults to streaming.
    pub fn from_message(state: Option<&str>) -> Self {
        match state {
            Some("waiting_for_data") | Some("waiting_for_connection") | Some("waiting") => {
                ConnectionState::Waiting
            }
            Some("buffering") => ConnectionState::Buffering,
            Some("retransmitting") => ConnectionState::Retransmitting,
            Some("warming_up") => ConnectionState::WarmingUp,
            Some("disconnected") => ConnectionState::Disconnected,
            _ => ConnectionState::Streaming,
        }
    }

    /// Whether payload values in this state may be forwarded to the pipeline.
    pub fn is_live(self) -> bool {
        !matches!(
            self,
            ConnectionState::Waiting | ConnectionState::Disconnected | ConnectionState::Connecting
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            ConnectionState::Streaming => "Streaming",
            ConnectionState::Buffering => "Buffering",
            ConnectionState::Retransmitting => "Retransmitting",
            ConnectionState::WarmingUp => "Warming Up",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Waiting | ConnectionState::Disconnected => {
                "Waiting for Connection..."
            }
        }
    }
}
