//! In-memory simulated board.
//!
//! Records every backend call as a timestamped [`BackendEvent`] so tests
//! (and `gpiolease --backend sim`) can observe exactly what the leasing
//! core asked the hardware to do, and in which order. The log is a ring:
//! once [`SimBackend::event_capacity`] is reached the oldest events are
//! dropped and counted.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use super::{Address, BackendResult, HardwareBackend, I2cHandle, Mode};
use crate::error::BackendError;
use crate::pin::{Pull, Value};

/// Events kept by [`SimBackend::new`] before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    SetMode(Address, Mode),
    Write(Address, Value),
    SetPull(Address, Pull),
    PwmDuty(Address, u32),
    PwmRange(u32),
    PwmTone(Address, u32),
    I2cOpen {
        device: Option<String>,
        bus_address: u16,
    },
    I2cWrite {
        bus_address: u16,
        byte: u8,
        result: i32,
    },
    I2cClose {
        bus_address: u16,
    },
}

/// A recorded call and when it happened.
#[derive(Debug, Clone)]
pub struct BackendEvent {
    pub at: Instant,
    pub kind: EventKind,
}

#[derive(Default)]
struct SimState {
    events: VecDeque<BackendEvent>,
    event_capacity: usize,
    dropped_events: u64,
    modes: HashMap<Address, Mode>,
    levels: HashMap<Address, Value>,
    pulls: HashMap<Address, Pull>,
    responders: HashSet<u16>,
    registers: HashMap<(u16, u8), u8>,
    open_buses: HashMap<u32, u16>,
    next_handle: u32,
    unreadable: HashSet<u16>,
}

/// Simulated hardware backend.
pub struct SimBackend {
    state: Mutex<SimState>,
}

impl SimBackend {
    /// A board with no responding I2C devices.
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Like [`SimBackend::new`], keeping at most `capacity` recent events.
    /// A capacity of `0` disables recording.
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(SimState {
                event_capacity: capacity,
                ..SimState::default()
            }),
        }
    }

    pub fn event_capacity(&self) -> usize {
        self.state.lock().unwrap().event_capacity
    }

    /// Events evicted from the log since creation or the last clear.
    pub fn dropped_events(&self) -> u64 {
        self.state.lock().unwrap().dropped_events
    }

    /// Declare which I2C bus addresses acknowledge a validation write.
    pub fn with_i2c_responders(self, addresses: &[u16]) -> Self {
        self.state
            .lock()
            .unwrap()
            .responders
            .extend(addresses.iter().copied());
        self
    }

    /// Set the byte returned for `register` on the device at `bus_address`.
    pub fn set_register(&self, bus_address: u16, register: u8, value: u8) {
        self.state
            .lock()
            .unwrap()
            .registers
            .insert((bus_address, register), value);
    }

    /// Make every register read on `bus_address` fail.
    pub fn fail_reads(&self, bus_address: u16) {
        self.state.lock().unwrap().unreadable.insert(bus_address);
    }

    /// Drive an input line from the outside world.
    pub fn set_input(&self, address: Address, value: Value) {
        self.state.lock().unwrap().levels.insert(address, value);
    }

    /// Current level of a line (`Off` if never driven).
    pub fn level(&self, address: Address) -> Value {
        self.state
            .lock()
            .unwrap()
            .levels
            .get(&address)
            .copied()
            .unwrap_or(Value::Off)
    }

    /// Current mode of a line, if it was ever configured.
    pub fn mode(&self, address: Address) -> Option<Mode> {
        self.state.lock().unwrap().modes.get(&address).copied()
    }

    /// Current pull of a line, if it was ever configured.
    pub fn pull(&self, address: Address) -> Option<Pull> {
        self.state.lock().unwrap().pulls.get(&address).copied()
    }

    /// Snapshot of the retained calls, oldest first.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.state.lock().unwrap().events.iter().cloned().collect()
    }

    /// Snapshot of recorded call kinds, without timestamps.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .map(|e| e.kind.clone())
            .collect()
    }

    /// Forget recorded calls; line state is kept.
    pub fn clear_events(&self) {
        let mut state = self.state.lock().unwrap();
        state.events.clear();
        state.dropped_events = 0;
    }

    /// Number of I2C connections currently open.
    pub fn open_i2c_count(&self) -> usize {
        self.state.lock().unwrap().open_buses.len()
    }

    fn record(state: &mut SimState, kind: EventKind) {
        if state.event_capacity == 0 {
            state.dropped_events += 1;
            return;
        }
        if state.events.len() == state.event_capacity {
            state.events.pop_front();
            state.dropped_events += 1;
        }
        state.events.push_back(BackendEvent {
            at: Instant::now(),
            kind,
        });
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareBackend for SimBackend {
    fn name(&self) -> &str {
        "sim"
    }

    fn set_mode(&self, address: Address, mode: Mode) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.modes.insert(address, mode);
        Self::record(&mut state, EventKind::SetMode(address, mode));
        Ok(())
    }

    fn read(&self, address: Address) -> BackendResult<Value> {
        let state = self.state.lock().unwrap();
        Ok(state.levels.get(&address).copied().unwrap_or(Value::Off))
    }

    fn write(&self, address: Address, value: Value) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.levels.insert(address, value);
        Self::record(&mut state, EventKind::Write(address, value));
        Ok(())
    }

    fn set_pull(&self, address: Address, pull: Pull) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.pulls.insert(address, pull);
        Self::record(&mut state, EventKind::SetPull(address, pull));
        Ok(())
    }

    fn pwm_write_duty(&self, address: Address, value: u32) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, EventKind::PwmDuty(address, value));
        Ok(())
    }

    fn pwm_set_range(&self, range: u32) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, EventKind::PwmRange(range));
        Ok(())
    }

    fn pwm_write_tone(&self, address: Address, frequency: u32) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, EventKind::PwmTone(address, frequency));
        Ok(())
    }

    fn i2c_open<'a>(
        &self,
        device: Option<&'a str>,
        bus_address: u16,
    ) -> BackendResult<I2cHandle> {
        let mut state = self.state.lock().unwrap();
        Self::record(
            &mut state,
            EventKind::I2cOpen {
                device: device.map(str::to_string),
                bus_address,
            },
        );
        let handle = state.next_handle;
        state.next_handle += 1;
        state.open_buses.insert(handle, bus_address);
        Ok(I2cHandle(handle))
    }

    fn i2c_write(&self, handle: I2cHandle, byte: u8) -> i32 {
        let mut state = self.state.lock().unwrap();
        let Some(&bus_address) = state.open_buses.get(&handle.0) else {
            return -1;
        };
        let result = if state.responders.contains(&bus_address) {
            1
        } else {
            -1
        };
        Self::record(
            &mut state,
            EventKind::I2cWrite {
                bus_address,
                byte,
                result,
            },
        );
        result
    }

    fn i2c_read_reg8(&self, handle: I2cHandle, register: u8) -> BackendResult<u8> {
        let state = self.state.lock().unwrap();
        let bus_address = *state
            .open_buses
            .get(&handle.0)
            .ok_or_else(|| BackendError::Io(format!("I2C handle {} not open", handle.0)))?;
        if state.unreadable.contains(&bus_address) {
            return Err(BackendError::Io(format!(
                "read of register {register} on 0x{bus_address:02x} failed"
            )));
        }
        Ok(state
            .registers
            .get(&(bus_address, register))
            .copied()
            .unwrap_or(0))
    }

    fn i2c_close(&self, handle: I2cHandle) {
        let mut state = self.state.lock().unwrap();
        if let Some(bus_address) = state.open_buses.remove(&handle.0) {
            Self::record(&mut state, EventKind::I2cClose { bus_address });
        }
    }
}
