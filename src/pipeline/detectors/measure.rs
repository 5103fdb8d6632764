use image::RgbImage;
use std::f64::consts::PI;

/// Spectral power below this total is treated as a flat signal.
const POWER_FLOOR: f64 = 1e-6;

/// 256-bin histogram of one 8-bit channel.
pub struct ChannelHistogram {
    bins: [u64; 256],
    total: u64,
}

impl ChannelHistogram {
    pub fn from_values(values: impl IntoIterator<Item = u8>) -> Self {
        let mut bins = [0u64; 256];
        let mut total = 0;
        for value in values {
            bins[value as usize] += 1;
            total += 1;
        }
        Self { bins, total }
    }

    /// Fraction of samples whose value is `<= threshold`. Empty histograms yield 0.
    pub fn fraction_at_or_below(&self, threshold: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let below: u64 = self.bins[..=threshold as usize].iter().sum();
        below as f64 / self.total as f64
    }
}

/// Saturation and value channels of an HSV conversion, 8-bit scaled.
pub fn saturation_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    if v == 0 {
        return (0, 0);
    }
    let s = (255.0 * (v - min) as f64 / v as f64).round() as u8;
    (s, v)
}

/// Separate saturation and luma histograms for a frame.
pub fn hsv_histograms(image: &RgbImage) -> (ChannelHistogram, ChannelHistogram) {
    let mut sat = [0u64; 256];
    let mut luma = [0u64; 256];
    let mut total = 0;
    for pixel in image.pixels() {
        let (s, v) = saturation_value(pixel[0], pixel[1], pixel[2]);
        sat[s as usize] += 1;
        luma[v as usize] += 1;
        total += 1;
    }
    (
        ChannelHistogram { bins: sat, total },
        ChannelHistogram { bins: luma, total },
    )
}

/// Mean of the HSV value channel.
pub fn mean_luma(image: &RgbImage) -> f64 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image
        .pixels()
        .map(|p| p[0].max(p[1]).max(p[2]) as u64)
        .sum();
    sum as f64 / count as f64
}

/// Mean absolute difference over all pixels and channels.
///
/// Returns `None` when the frames do not share dimensions or hold no pixels.
pub fn mean_abs_diff(a: &RgbImage, b: &RgbImage) -> Option<f64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let raw_a = a.as_raw();
    let raw_b = b.as_raw();
    if raw_a.is_empty() {
        return None;
    }
    let sum: u64 = raw_a
        .iter()
        .zip(raw_b.iter())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    Some(sum as f64 / raw_a.len() as f64)
}

/// One-sided power spectrum of a real sequence (bins `0..=n/2`).
pub fn power_spectrum(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    (0..=n / 2)
        .map(|k| {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, sample) in samples.iter().enumerate() {
                let angle = -2.0 * PI * (k * t) as f64 / n as f64;
                re += sample * angle.cos();
                im += sample * angle.sin();
            }
            re * re + im * im
        })
        .collect()
}

/// Share of spectral power at bin 2 and above after removing the mean.
///
/// Bins 0 and 1 carry the DC level and slow drift, so they never count
/// towards the ratio. Flat signals report 0.
pub fn high_frequency_ratio(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let centered: Vec<f64> = samples.iter().map(|s| s - mean).collect();
    let power = power_spectrum(&centered);
    let total: f64 = power.iter().sum();
    if total <= POWER_FLOOR {
        return 0.0;
    }
    power.iter().skip(2).sum::<f64>() / total
}
