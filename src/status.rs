//! Decoding of the thermocouple meter's status report.
//!
//! The report is a [`STATUS_FRAME_LEN`] byte frame:
//!
//! | Offset | Content                                                    |
//! |--------|------------------------------------------------------------|
//! | 0      | Start byte `0x02`                                          |
//! | 1      | Battery gauge                                              |
//! | 2      | [`ModeFlags`]                                              |
//! | 3      | [`SystemFlags`]                                            |
//! | 4      | [`SubmodeFlags`]                                           |
//! | 5      | [`ProbeTypeFlags`]                                         |
//! | 6      | [`ChannelFlags`]                                           |
//! | 9..19  | Big-endian signed readings of T1, T2, T3, T4 and T1-T2     |
//! | 62     | Sum of bytes 1 to 61 modulo 256                            |
//! | 63     | End byte                                                   |

use modular_bitfield::prelude::*;
use strum_macros::EnumIter;

use crate::error::{Error, Result};

/// Length of the status report frame.
pub const STATUS_FRAME_LEN: usize = 64;
/// First byte of every meter frame.
pub const STX: u8 = 0x02;

const BATTERY_POS: usize = 1;
const MODE_POS: usize = 2;
const SYSTEM_POS: usize = 3;
const SUBMODE_POS: usize = 4;
const PROBE_TYPE_POS: usize = 5;
const CHANNEL_POS: usize = 6;
const PROBE_READING_POS: [usize; PROBE_COUNT] = [9, 11, 13, 15];
const DIFFERENTIAL_READING_POS: usize = 17;
/// Bytes `1..=CHECKSUM_POS - 1` are summed.
const CHECKSUM_POS: usize = 62;

/// Battery gauge steps are reported in units of this many percent.
const BATTERY_PERCENT_PER_STEP: u16 = 33;

/// Number of probe inputs.
pub const PROBE_COUNT: usize = 4;

/// One status frame as read from the meter.
pub type StatusFrame = [u8; STATUS_FRAME_LEN];

/// Byte 2, measurement mode and per-channel display range.
///
/// A set range flag means the reading is a whole number of degrees, otherwise it is in
/// tenths of a degree.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct ModeFlags {
    pub differential_mode: bool,
    pub recall_mode: bool,
    pub t1_high_range: bool,
    pub t2_high_range: bool,
    pub t3_high_range: bool,
    pub t4_high_range: bool,
    pub differential_high_range: bool,
    pub celsius: bool,
}

/// Byte 3, alarm and system state.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct SystemFlags {
    pub alarm_enabled: bool,
    pub over_temperature: bool,
    pub under_temperature: bool,
    pub recording: bool,
    pub memory_full: bool,
    pub hold: bool,
    pub min_max_mode: bool,
    pub bluetooth_enabled: bool,
}

/// Byte 4, the min/max/avg display submode.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct SubmodeFlags {
    pub max: bool,
    pub min: bool,
    pub avg: bool,
    pub min_max_avg: bool,
    #[skip]
    __: B4,
}

/// Byte 5, the selected thermocouple type.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct ProbeTypeFlags {
    pub k: bool,
    pub j: bool,
    pub e: bool,
    pub t: bool,
    #[skip]
    __: B4,
}

/// Byte 6, over-limit and unplugged flags of T1 to T4.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct ChannelFlags {
    pub t1_over_limit: bool,
    pub t2_over_limit: bool,
    pub t3_over_limit: bool,
    pub t4_over_limit: bool,
    pub t1_unplugged: bool,
    pub t2_unplugged: bool,
    pub t3_unplugged: bool,
    pub t4_unplugged: bool,
}

/// Unit of all temperature readings in a report.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// Which statistic the display shows while in min/max mode.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum MinMaxSubmode {
    Max,
    Min,
    Avg,
    MinMaxAvg,
}

/// Thermocouple type selected on the meter.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum ProbeType {
    K,
    J,
    E,
    T,
}

/// State of one probe input.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ProbeReading {
    pub over_limit: bool,
    pub unplugged: bool,
    pub high_range: bool,
    /// `None` when over limit, unplugged or hidden by differential mode.
    pub temperature: Option<f32>,
}

/// Everything reported by one status query.
#[derive(Debug, PartialEq, Clone)]
pub struct DeviceStatusRecord {
    /// Battery level in percent.
    pub battery: u16,
    pub unit: TemperatureUnit,
    /// Showing T1-T2 instead of T3 and T4.
    pub differential_mode: bool,
    pub recall_mode: bool,
    pub alarm_enabled: bool,
    pub over_temperature: bool,
    pub under_temperature: bool,
    pub recording: bool,
    pub memory_full: bool,
    pub hold: bool,
    pub min_max_mode: bool,
    pub bluetooth_enabled: bool,
    /// Only present while in min/max mode.
    pub min_max_submode: Option<MinMaxSubmode>,
    pub probe_type: Option<ProbeType>,
    /// T1 to T4.
    pub probes: [ProbeReading; PROBE_COUNT],
    pub differential_high_range: bool,
    /// T1-T2, only present in differential mode with both T1 and T2 readable.
    pub differential: Option<f32>,
}

impl DeviceStatusRecord {
    /// Temperature of probe `1` to `4`.
    pub fn temperature(&self, probe: usize) -> Option<f32> {
        self.probes
            .get(probe.checked_sub(1)?)
            .and_then(|reading| reading.temperature)
    }
}

/// Sum of the checksummed region of a status frame.
pub fn status_checksum(frame: &StatusFrame) -> u8 {
    frame[1..CHECKSUM_POS]
        .iter()
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Validate a status frame and decode it.
///
/// The checksum is checked before any field is decoded. On [`Error::ChecksumMismatch`]
/// nothing from the frame may be used and the query should be repeated.
pub fn decode_status<I: embedded_io::Error>(frame: &StatusFrame) -> Result<DeviceStatusRecord, I> {
    if frame[0] != STX {
        log::warn!("Invalid status start byte {:#04X}", frame[0]);
        return Err(Error::Malformed);
    }

    let calculated = status_checksum(frame);
    if calculated != frame[CHECKSUM_POS] {
        log::warn!(
            "Status checksum mismatch - calculated={:02X?} received={:02X?}, discarding report",
            calculated,
            frame[CHECKSUM_POS]
        );
        return Err(Error::ChecksumMismatch {
            calculated,
            received: frame[CHECKSUM_POS],
        });
    }

    let mode = ModeFlags::from_bytes([frame[MODE_POS]]);
    let system = SystemFlags::from_bytes([frame[SYSTEM_POS]]);
    let submode = SubmodeFlags::from_bytes([frame[SUBMODE_POS]]);
    let probe_type = ProbeTypeFlags::from_bytes([frame[PROBE_TYPE_POS]]);
    let channels = ChannelFlags::from_bytes([frame[CHANNEL_POS]]);

    let min_max_submode = if system.min_max_mode() {
        first_match([
            (submode.max(), MinMaxSubmode::Max),
            (submode.min(), MinMaxSubmode::Min),
            (submode.avg(), MinMaxSubmode::Avg),
            (submode.min_max_avg(), MinMaxSubmode::MinMaxAvg),
        ])
    } else {
        None
    };

    let probe_type = first_match([
        (probe_type.k(), ProbeType::K),
        (probe_type.j(), ProbeType::J),
        (probe_type.e(), ProbeType::E),
        (probe_type.t(), ProbeType::T),
    ]);

    let over_limit = [
        channels.t1_over_limit(),
        channels.t2_over_limit(),
        channels.t3_over_limit(),
        channels.t4_over_limit(),
    ];
    let unplugged = [
        channels.t1_unplugged(),
        channels.t2_unplugged(),
        channels.t3_unplugged(),
        channels.t4_unplugged(),
    ];
    let high_range = [
        mode.t1_high_range(),
        mode.t2_high_range(),
        mode.t3_high_range(),
        mode.t4_high_range(),
    ];

    let probes: [ProbeReading; PROBE_COUNT] = core::array::from_fn(|i| {
        // T3 and T4 are not shown in differential mode.
        let hidden = mode.differential_mode() && i >= 2;
        let temperature = if over_limit[i] || unplugged[i] || hidden {
            None
        } else {
            Some(reading(frame, PROBE_READING_POS[i], high_range[i]))
        };
        ProbeReading {
            over_limit: over_limit[i],
            unplugged: unplugged[i],
            high_range: high_range[i],
            temperature,
        }
    });

    let differential_inputs_ok = (0..2).all(|i| !over_limit[i] && !unplugged[i]);
    let differential = if mode.differential_mode() && differential_inputs_ok {
        Some(reading(
            frame,
            DIFFERENTIAL_READING_POS,
            mode.differential_high_range(),
        ))
    } else {
        None
    };

    Ok(DeviceStatusRecord {
        battery: frame[BATTERY_POS] as u16 * BATTERY_PERCENT_PER_STEP,
        unit: if mode.celsius() {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        },
        differential_mode: mode.differential_mode(),
        recall_mode: mode.recall_mode(),
        alarm_enabled: system.alarm_enabled(),
        over_temperature: system.over_temperature(),
        under_temperature: system.under_temperature(),
        recording: system.recording(),
        memory_full: system.memory_full(),
        hold: system.hold(),
        min_max_mode: system.min_max_mode(),
        bluetooth_enabled: system.bluetooth_enabled(),
        min_max_submode,
        probe_type,
        probes,
        differential_high_range: mode.differential_high_range(),
        differential,
    })
}

/// Earliest entry whose flag is set.
fn first_match<T: Copy, const N: usize>(table: [(bool, T); N]) -> Option<T> {
    table.iter().find(|(set, _)| *set).map(|(_, value)| *value)
}

/// Signed big-endian reading, in tenths of a degree unless `high_range`.
fn reading(frame: &StatusFrame, offset: usize, high_range: bool) -> f32 {
    let raw = i16::from_be_bytes([frame[offset], frame[offset + 1]]) as f32;
    if high_range { raw } else { raw / 10.0 }
}
