//! Synthetic Kelvin temperature cubes.

/// Creates a `(time, level, lat, lon)` cube of Kelvin temperatures.
///
/// The surface field rises from 285K at the south-west corner towards 305K
/// in the north-east, so values increase with both the latitude and the
/// longitude index. Each time step adds a diurnal swing of ±5K and each
/// level above the first is 6.5K colder.
pub fn create_temperature_cube(
    times: usize,
    levels: usize,
    height: usize,
    width: usize,
) -> Vec<f32> {
    let mut base = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            base.push(285.0 + x_factor * 10.0 + y_factor * 10.0);
        }
    }

    let mut data = Vec::with_capacity(times * levels * height * width);
    for t in 0..times {
        let diurnal = 5.0 * (t as f32 * std::f32::consts::PI / 12.0).sin();
        for level in 0..levels {
            let lapse = level as f32 * 6.5;
            data.extend(base.iter().map(|v| v + diurnal - lapse));
        }
    }
    data
}
