//! 寄存器编解码
//!
//! 16 位寄存器字到 S16 / U16 / F32 的纯函数转换，不涉及 I/O。
//! F32 占两个连续寄存器，高 16 位在前（大端字序）。

/// U16 按补码解释为 S16。
pub fn u16_to_s16(word: u16) -> i16 {
    word as i16
}

/// 两个寄存器组合为 IEEE-754 单精度浮点数（高字在前）。
///
/// 位模式重解释对任意输入都成立；NaN / 无穷大原样返回，由调用方判定状态。
pub fn u16_pair_to_f32(high: u16, low: u16) -> f32 {
    let bits = (u32::from(high) << 16) | u32::from(low);
    f32::from_bits(bits)
}

/// `u16_pair_to_f32` 的逆运算。
pub fn f32_to_u16_pair(value: f32) -> (u16, u16) {
    let bits = value.to_bits();
    ((bits >> 16) as u16, (bits & 0xFFFF) as u16)
}

/// 按十进制小数位四舍五入；非有限值原样返回。
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// 将寄存器序列两两配对解码为 F32，返回解码结果与被丢弃的尾字数量。
pub fn decode_f32_words(words: &[u16]) -> (Vec<f32>, usize) {
    let values = words
        .chunks_exact(2)
        .map(|pair| u16_pair_to_f32(pair[0], pair[1]))
        .collect();
    (values, words.len() % 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16_boundaries() {
        assert_eq!(u16_to_s16(0), 0);
        assert_eq!(u16_to_s16(32767), 32767);
        assert_eq!(u16_to_s16(32768), -32768);
        assert_eq!(u16_to_s16(65535), -1);
    }

    #[test]
    fn f32_reference_values() {
        // 0x42430000 / 0x42F88000
        assert_eq!(u16_pair_to_f32(16963, 0), 48.75);
        assert_eq!(u16_pair_to_f32(17144, 32768), 124.25);
        assert_eq!(u16_pair_to_f32(0x3F80, 0), 1.0);
        assert_eq!(u16_pair_to_f32(0xC000, 0), -2.0);
    }

    #[test]
    fn f32_round_trip_is_bit_exact() {
        let samples = [
            0.0f32,
            -0.0,
            1.0,
            -1.5,
            3.141_592_7,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::MIN,
            f32::EPSILON,
            f32::INFINITY,
            f32::NEG_INFINITY,
            1.0e-40, // subnormal
        ];
        for value in samples {
            let (high, low) = f32_to_u16_pair(value);
            assert_eq!(u16_pair_to_f32(high, low).to_bits(), value.to_bits());
        }

        let nan = f32::from_bits(0x7FC0_1234);
        let (high, low) = f32_to_u16_pair(nan);
        assert_eq!(u16_pair_to_f32(high, low).to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn f32_round_trip_over_bit_pattern_sweep() {
        // 以大步长覆盖整个 32 位空间（含 NaN 区间）
        let mut bits: u32 = 0;
        loop {
            let value = f32::from_bits(bits);
            let (high, low) = f32_to_u16_pair(value);
            assert_eq!(u16_pair_to_f32(high, low).to_bits(), bits);
            match bits.checked_add(65_537) {
                Some(next) => bits = next,
                None => break,
            }
        }
    }

    #[test]
    fn odd_word_is_dropped() {
        let (values, dropped) = decode_f32_words(&[16963, 0, 17144, 32768, 7]);
        assert_eq!(values, vec![48.75, 124.25]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn rounding_to_four_decimals() {
        assert_eq!(round_to(1.234_56, 4), 1.2346);
        assert_eq!(round_to(-0.000_04, 4), -0.0);
        assert!(round_to(f64::NAN, 4).is_nan());
    }
}
