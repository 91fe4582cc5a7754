/// Supported debug command payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    Tick {
        steps: u32,
        /// Seconds per step; the app's current delta when absent.
        delta: Option<f32>,
    },
    SetLevel {
        actor_bits: u64,
        level: f32,
    },
    Drink {
        actor_bits: u64,
        item_id: String,
    },
    Sleep {
        actor_bits: u64,
        directive: SleepDirective,
    },
    Ready {
        actor_bits: u64,
    },
    Kill {
        actor_bits: u64,
    },
    Refill {
        actor_bits: u64,
        slot: u32,
        position: [i32; 3],
        resource: ResourceToken,
    },
    Status {
        actor_bits: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepDirective {
    Awake,
    Slumber,
}

/// Tile layer named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceToken {
    #[default]
    Block,
    Fluid,
}

impl CommandPayload {
    /// Actor the command addresses, if any.
    pub fn actor_bits(&self) -> Option<u64> {
        match self {
            CommandPayload::Tick { .. } => None,
            CommandPayload::SetLevel { actor_bits, .. }
            | CommandPayload::Drink { actor_bits, .. }
            | CommandPayload::Sleep { actor_bits, .. }
            | CommandPayload::Ready { actor_bits }
            | CommandPayload::Kill { actor_bits }
            | CommandPayload::Refill { actor_bits, .. }
            | CommandPayload::Status { actor_bits } => Some(*actor_bits),
        }
    }
}
