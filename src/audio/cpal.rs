// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, fmt, sync::Arc};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use tracing::{error, info, span, warn, Level};

use super::engine::AudioEngine;
use super::format::Channels;
use crate::config;

/// An output device known to cpal.
pub struct DeviceInfo {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Lists output devices across every available host.
pub fn list_devices() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
    Ok(list_cpal_devices()?
        .into_iter()
        .map(|(info, _)| info)
        .collect())
}

fn list_cpal_devices() -> Result<Vec<(DeviceInfo, cpal::Device)>, Box<dyn Error>> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let Ok(output_configs) = device.supported_output_configs() else {
                continue;
            };
            let max_channels = output_configs
                .map(|output_config| output_config.channels())
                .max()
                .unwrap_or(0);

            if max_channels > 0 {
                devices.push((
                    DeviceInfo {
                        name: device.name()?,
                        max_channels,
                        host_id,
                    },
                    device,
                ));
            }
        }
    }

    devices.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
    Ok(devices)
}

/// Finds the configured device. "default" picks the default host's default
/// output device.
fn find_device(name: &str) -> Result<(String, cpal::Device), Box<dyn Error>> {
    if name == "default" {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or("no default output device")?;
        let name = device.name()?;
        return Ok((name, device));
    }

    list_cpal_devices()?
        .into_iter()
        .find(|(info, _)| info.name.trim() == name)
        .map(|(info, device)| (info.name, device))
        .ok_or_else(|| format!("no device found with name {}", name).into())
}

/// A running output stream that pulls every period from an [`AudioEngine`].
/// Dropping it stops the stream.
pub struct Output {
    name: String,
    engine: Arc<AudioEngine>,
    stream: cpal::Stream,
}

impl Output {
    /// Opens the configured device and starts a stream at the engine's rate
    /// and channel count.
    pub fn open(engine: Arc<AudioEngine>, config: &config::Audio) -> Result<Output, Box<dyn Error>> {
        let span = span!(Level::INFO, "open output (cpal)");
        let _enter = span.enter();

        let (name, device) = find_device(config.device())?;
        let sample_format = device.default_output_config()?.sample_format();
        let period_frames = config.buffer_size();

        let fixed = cpal::StreamConfig {
            channels: engine.channels().count() as u16,
            sample_rate: cpal::SampleRate(engine.sample_rate()),
            buffer_size: cpal::BufferSize::Fixed(period_frames as u32),
        };
        let stream = match build_stream(&device, &fixed, sample_format, &engine, period_frames) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    err = %e,
                    period_frames,
                    "Fixed buffer size rejected, using the backend default"
                );
                let config = cpal::StreamConfig {
                    buffer_size: cpal::BufferSize::Default,
                    ..fixed
                };
                build_stream(&device, &config, sample_format, &engine, period_frames)?
            }
        };
        stream.play()?;

        info!(
            device = name,
            sample_rate = engine.sample_rate(),
            channels = engine.channels().count(),
            format = ?sample_format,
            "Output stream started"
        );

        Ok(Output {
            name,
            engine,
            stream,
        })
    }

    /// The name of the device being played through.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pause(&self) -> Result<(), Box<dyn Error>> {
        self.stream.pause()?;
        Ok(())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.engine)
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    engine: &Arc<AudioEngine>,
    period_frames: usize,
) -> Result<cpal::Stream, Box<dyn Error>> {
    match sample_format {
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, config, engine, period_frames),
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, config, engine, period_frames),
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, config, engine, period_frames),
        other => Err(format!("unsupported output sample format {:?}", other).into()),
    }
}

/// Builds a stream of `T` samples. The engine always mixes to i16 into a
/// scratch buffer allocated here; the callback only grows it if the backend
/// asks for a larger period than configured.
fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    engine: &Arc<AudioEngine>,
    period_frames: usize,
) -> Result<cpal::Stream, Box<dyn Error>>
where
    T: SizedSample + FromSample<i16>,
{
    let engine = engine.clone();
    let channels: Channels = engine.channels();
    let mut scratch = vec![0i16; period_frames * channels.count()];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if scratch.len() < data.len() {
                scratch.resize(data.len(), 0);
            }
            let period = &mut scratch[..data.len()];
            engine.mix(period, channels);
            for (dst, &src) in data.iter_mut().zip(period.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
