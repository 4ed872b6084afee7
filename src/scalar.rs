// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! [`ScalarValue`]: the representation resolvers produce for scalar descriptors

use arrow_schema::TimeUnit;
use num::{Float, NumCast, PrimInt};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A single non-null scalar value
///
/// Values are converted to the physical type of the vector they are written
/// into. Conversions are lossless: the `to_*` methods return `None` whenever the
/// value cannot be represented exactly in the requested type.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// A boolean
    Boolean(bool),
    /// A signed 8-bit integer
    Int8(i8),
    /// A signed 16-bit integer
    Int16(i16),
    /// A signed 32-bit integer
    Int32(i32),
    /// A signed 64-bit integer
    Int64(i64),
    /// An unsigned 8-bit integer
    UInt8(u8),
    /// An unsigned 16-bit integer
    UInt16(u16),
    /// An unsigned 32-bit integer
    UInt32(u32),
    /// An unsigned 64-bit integer
    UInt64(u64),
    /// A 32-bit float
    Float32(f32),
    /// A 64-bit float
    Float64(f64),
    /// A 128-bit decimal, `value * 10^-scale`
    Decimal128 {
        /// The unscaled value
        value: i128,
        /// Total number of digits
        precision: u8,
        /// Digits after the decimal point
        scale: i8,
    },
    /// UTF-8 text
    Utf8(String),
    /// Opaque bytes
    Binary(Vec<u8>),
    /// Days since the UNIX epoch
    Date32(i32),
    /// Milliseconds since the UNIX epoch
    Date64(i64),
    /// A time of day in `unit` since midnight
    Time {
        /// The time of day
        value: i64,
        /// Resolution of `value`
        unit: TimeUnit,
    },
    /// An instant in `unit` since the UNIX epoch
    Timestamp {
        /// The instant
        value: i64,
        /// Resolution of `value`
        unit: TimeUnit,
    },
}

impl ScalarValue {
    fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Self::Int8(v) => *v as i128,
            Self::Int16(v) => *v as i128,
            Self::Int32(v) => *v as i128,
            Self::Int64(v) => *v as i128,
            Self::UInt8(v) => *v as i128,
            Self::UInt16(v) => *v as i128,
            Self::UInt32(v) => *v as i128,
            Self::UInt64(v) => *v as i128,
            Self::Decimal128 { value, scale, .. } => return rescale_decimal(*value, *scale, 0),
            _ => return None,
        })
    }

    /// Returns this value as a boolean
    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as an integer of type `T`, if it is an integer (or
    /// integral decimal) within the range of `T`
    pub fn to_int<T: PrimInt + NumCast>(&self) -> Option<T> {
        num::cast(self.as_i128()?)
    }

    /// Returns this value as a float of type `T`, if it can be represented
    /// exactly
    pub fn to_float<T: Float + NumCast>(&self) -> Option<T> {
        match self {
            Self::Float32(v) => exact_float(*v),
            Self::Float64(v) => exact_float(*v),
            _ => {
                let v = self.as_i128()?;
                let f: T = num::cast(v)?;
                (num::cast::<T, i128>(f)? == v).then_some(f)
            }
        }
    }

    /// Returns the unscaled value of this value as a decimal with the given
    /// `precision` and `scale`
    pub fn to_decimal(&self, precision: u8, scale: i8) -> Option<i128> {
        let value = match self {
            Self::Decimal128 {
                value,
                scale: from,
                ..
            } => rescale_decimal(*value, *from, scale)?,
            Self::Float32(_) | Self::Float64(_) => return None,
            _ => rescale_decimal(self.as_i128()?, 0, scale)?,
        };
        let bound = 10_u128.checked_pow(precision as u32)?;
        (value.unsigned_abs() < bound).then_some(value)
    }

    /// Returns this value as text, validating binary values as UTF-8
    pub fn to_utf8(&self) -> Option<&str> {
        match self {
            Self::Utf8(v) => Some(v.as_str()),
            Self::Binary(v) => simdutf8::basic::from_utf8(v).ok(),
            _ => None,
        }
    }

    /// Returns the bytes of a text or binary value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Utf8(v) => Some(v.as_bytes()),
            Self::Binary(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns this value as days since the UNIX epoch
    pub fn to_date32(&self) -> Option<i32> {
        match self {
            Self::Date32(v) => Some(*v),
            Self::Date64(v) => (v % MILLIS_PER_DAY == 0)
                .then(|| i32::try_from(v / MILLIS_PER_DAY).ok())
                .flatten(),
            _ => None,
        }
    }

    /// Returns this value as milliseconds since the UNIX epoch
    ///
    /// Times of day are interpreted as an offset from the epoch.
    pub fn to_date64(&self) -> Option<i64> {
        match self {
            Self::Date64(v) => Some(*v),
            Self::Date32(v) => (*v as i64).checked_mul(MILLIS_PER_DAY),
            Self::Time { value, unit } => rescale_time(*value, *unit, TimeUnit::Millisecond),
            _ => None,
        }
    }

    /// Returns this value as an instant in `unit` since the UNIX epoch
    pub fn to_timestamp(&self, unit: TimeUnit) -> Option<i64> {
        match self {
            Self::Timestamp { value, unit: from } => rescale_time(*value, *from, unit),
            Self::Date64(v) => rescale_time(*v, TimeUnit::Millisecond, unit),
            Self::Date32(v) => rescale_time(*v as i64, TimeUnit::Second, unit)?
                .checked_mul(MILLIS_PER_DAY / 1000),
            _ => None,
        }
    }
}

fn exact_float<S: Float + NumCast, T: Float + NumCast>(v: S) -> Option<T> {
    if v.is_nan() {
        return Some(T::nan());
    }
    let t: T = num::cast(v)?;
    (num::cast::<T, S>(t)? == v).then_some(t)
}

fn rescale_decimal(value: i128, from: i8, to: i8) -> Option<i128> {
    let diff = to as i32 - from as i32;
    let factor = 10_i128.checked_pow(diff.unsigned_abs())?;
    match diff >= 0 {
        true => value.checked_mul(factor),
        false => (value % factor == 0).then_some(value / factor),
    }
}

fn units_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    }
}

fn rescale_time(value: i64, from: TimeUnit, to: TimeUnit) -> Option<i64> {
    let (from, to) = (units_per_second(from), units_per_second(to));
    match to >= from {
        true => value.checked_mul(to / from),
        false => {
            let factor = from / to;
            (value % factor == 0).then_some(value / factor)
        }
    }
}
