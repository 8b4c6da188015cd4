use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use phosphor_core::AudioSource;

use crate::error::AudioError;

/// A live output stream that pulls frames from an [`AudioSource`].
///
/// The stream runs from creation; it writes silence until the source is
/// started, so the display and the speakers both key off the same cursor.
/// Dropping the value closes the stream.
pub struct Playback {
    _stream: cpal::Stream,
}

impl Playback {
    /// Open the default output device at the source's sample rate.
    ///
    /// Fails when there is no device or it cannot run at that rate; callers
    /// then advance the source from the frame clock instead.
    pub fn open(source: Arc<AudioSource>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = choose_config(&device, source.sample_rate(), source.channels())?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, source)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, source)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, source)?,
            other => return Err(AudioError::UnsupportedFormat(other)),
        };
        stream.play()?;

        log::info!(
            "audio output on '{}': {} ch, {} Hz, {:?}",
            device_name,
            config.channels,
            config.sample_rate.0,
            sample_format
        );

        Ok(Self { _stream: stream })
    }
}

fn choose_config(
    device: &cpal::Device,
    rate: u32,
    channels: usize,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    let mut best: Option<(u32, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let score = config_score(
            range.channels(),
            range.min_sample_rate().0,
            range.max_sample_rate().0,
            range.sample_format(),
            rate,
            channels,
        );
        if let Some(score) = score {
            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((score, range));
            }
        }
    }

    let (_, range) = best.ok_or(AudioError::UnsupportedSampleRate { rate })?;
    Ok(range.with_sample_rate(cpal::SampleRate(rate)))
}

/// Lower is better; `None` when the range cannot play `rate` or the format
/// has no conversion here.
fn config_score(
    range_channels: u16,
    min_rate: u32,
    max_rate: u32,
    format: cpal::SampleFormat,
    rate: u32,
    channels: usize,
) -> Option<u32> {
    if !(min_rate..=max_rate).contains(&rate) || range_channels == 0 {
        return None;
    }
    let format_pen = match format {
        cpal::SampleFormat::F32 => 0,
        cpal::SampleFormat::I16 => 1,
        cpal::SampleFormat::U16 => 2,
        _ => return None,
    };
    let channel_pen = (range_channels as usize).abs_diff(channels) as u32;
    Some(channel_pen * 10 + format_pen)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source: Arc<AudioSource>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();
    let err_fn = |e: cpal::StreamError| log::error!("audio stream error: {e}");

    let stream = device.build_output_stream(
        config,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(output.len(), 0.0);
            source.fill_interleaved(&mut scratch, channels);
            for (out, &s) in output.iter_mut().zip(&scratch) {
                *out = T::from_sample(s.clamp(-1.0, 1.0));
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
