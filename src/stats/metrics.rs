//! Statistics for the broadcast engine

use crate::session::PlaybackPhase;

/// Engine-wide statistics snapshot
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Current playback phase
    pub phase: PlaybackPhase,
    /// Pacing rate of the current pipeline (bytes/sec), 0 before the first start
    pub bitrate: u64,
    /// Connected listeners
    pub clients: usize,
    /// Chunks handed to the registry
    pub chunks_broadcast: u64,
    /// Bytes handed to the registry
    pub bytes_broadcast: u64,
    /// Listeners dropped for falling behind
    pub clients_evicted: u64,
    /// Effects spliced since the engine was created
    pub effects_triggered: u64,
}

impl EngineStats {
    /// Seconds of audio broadcast so far at the current rate
    pub fn seconds_broadcast(&self) -> f64 {
        if self.bitrate > 0 {
            self.bytes_broadcast as f64 / self.bitrate as f64
        } else {
            0.0
        }
    }

    /// Average chunk size in bytes
    pub fn average_chunk_size(&self) -> u64 {
        if self.chunks_broadcast > 0 {
            self.bytes_broadcast / self.chunks_broadcast
        } else {
            0
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            bitrate: 0,
            clients: 0,
            chunks_broadcast: 0,
            bytes_broadcast: 0,
            clients_evicted: 0,
            effects_triggered: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_stats_default() {
        let stats = EngineStats::default();
        assert_eq!(stats.phase, PlaybackPhase::Idle);
        assert_eq!(stats.clients, 0);
        assert_eq!(stats.seconds_broadcast(), 0.0);
        assert_eq!(stats.average_chunk_size(), 0);
    }

    #[test]
    fn test_engine_stats_with_data() {
        let stats = EngineStats {
            phase: PlaybackPhase::Playing,
            bitrate: 16_000,
            clients: 3,
            chunks_broadcast: 20,
            bytes_broadcast: 32_000,
            clients_evicted: 0,
            effects_triggered: 1,
        };

        // 32,000 bytes at 16,000 bytes/sec
        assert_eq!(stats.seconds_broadcast(), 2.0);
        assert_eq!(stats.average_chunk_size(), 1_600);
    }
}
