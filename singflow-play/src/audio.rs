use singflow_core::practice::{Clip, PracticeAudio};
use singflow_core::{LyricError, Result};

/// 未启用 `mic` 特性时使用：录音直接报告不支持
#[derive(Debug, Default)]
pub struct NoAudio;

impl PracticeAudio for NoAudio {
    fn start(&mut self) -> Result<()> {
        Err(LyricError::CaptureUnsupported)
    }

    fn stop(&mut self) -> Result<Clip> {
        Err(LyricError::CaptureUnsupported)
    }

    fn is_recording(&self) -> bool {
        false
    }

    fn play(&mut self, _clip: &Clip) -> Result<()> {
        Err(LyricError::CaptureUnsupported)
    }
}

#[cfg(feature = "mic")]
pub use mic::MicRecorder;

#[cfg(feature = "mic")]
mod mic {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use log::{debug, error};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamBuilder, Sink};
    use singflow_core::practice::{Clip, PracticeAudio};
    use singflow_core::{LyricError, Result};
    use std::sync::{Arc, Mutex};

    /// 默认输入设备录音，默认输出设备回放
    ///
    /// `cpal::Stream` 在部分平台上不是 `Send`，因此只能在创建它的线程上使用
    #[derive(Default)]
    pub struct MicRecorder {
        stream: Option<cpal::Stream>,
        buffer: Arc<Mutex<Vec<f32>>>,
        sample_rate: u32,
        channels: u16,

        // 回放
        output: Option<OutputStream>,
        sink: Option<Sink>,
    }

    impl MicRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        fn build_stream(&mut self) -> Result<cpal::Stream> {
            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| LyricError::CaptureFailed(String::from("no input device")))?;
            let cfg = device
                .default_input_config()
                .map_err(|e| LyricError::CaptureFailed(e.to_string()))?;

            self.sample_rate = cfg.sample_rate().0;
            self.channels = cfg.channels();
            debug!(
                "recording from {:?} at {} Hz, {} channel(s)",
                device.name().ok(),
                self.sample_rate,
                self.channels
            );

            let on_error = |e: cpal::StreamError| error!("input stream error: {}", e);
            let buffer = Arc::clone(&self.buffer);
            let stream = match cfg.sample_format() {
                cpal::SampleFormat::F32 => device.build_input_stream(
                    &cfg.config(),
                    move |data: &[f32], _| {
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.extend_from_slice(data);
                        }
                    },
                    on_error,
                    None,
                ),
                cpal::SampleFormat::I16 => device.build_input_stream(
                    &cfg.config(),
                    move |data: &[i16], _| {
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.extend(data.iter().map(|s| *s as f32 / i16::MAX as f32));
                        }
                    },
                    on_error,
                    None,
                ),
                cpal::SampleFormat::U16 => device.build_input_stream(
                    &cfg.config(),
                    move |data: &[u16], _| {
                        let center = (u16::MAX / 2) as f32;
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.extend(data.iter().map(|s| (*s as f32 - center) / center));
                        }
                    },
                    on_error,
                    None,
                ),
                other => {
                    return Err(LyricError::CaptureFailed(format!(
                        "unsupported sample format {:?}",
                        other
                    )))
                }
            };

            stream.map_err(|e| LyricError::CaptureFailed(e.to_string()))
        }
    }

    impl PracticeAudio for MicRecorder {
        fn start(&mut self) -> Result<()> {
            if self.stream.is_some() {
                return Err(LyricError::CaptureFailed(String::from("already recording")));
            }

            if let Ok(mut buffer) = self.buffer.lock() {
                buffer.clear();
            }
            let stream = self.build_stream()?;
            stream
                .play()
                .map_err(|e| LyricError::CaptureFailed(e.to_string()))?;
            self.stream = Some(stream);
            Ok(())
        }

        fn stop(&mut self) -> Result<Clip> {
            let stream = self
                .stream
                .take()
                .ok_or_else(|| LyricError::CaptureFailed(String::from("not recording")))?;
            // 释放设备
            drop(stream);

            let samples = match self.buffer.lock() {
                Ok(mut buffer) => std::mem::take(&mut *buffer),
                Err(_) => Vec::new(),
            };

            Ok(Clip {
                samples,
                sample_rate: self.sample_rate,
                channels: self.channels,
            })
        }

        fn is_recording(&self) -> bool {
            self.stream.is_some()
        }

        fn play(&mut self, clip: &Clip) -> Result<()> {
            if clip.channels == 0 || clip.sample_rate == 0 {
                return Ok(());
            }

            if self.output.is_none() {
                let mut output = OutputStreamBuilder::open_default_stream()
                    .map_err(|e| LyricError::CaptureFailed(e.to_string()))?;
                output.log_on_drop(false);
                self.output = Some(output);
            }
            let Some(output) = self.output.as_ref() else {
                return Ok(());
            };

            // 新的回放替换正在进行的回放
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            let sink = Sink::connect_new(output.mixer());
            sink.append(SamplesBuffer::new(
                clip.channels,
                clip.sample_rate,
                clip.samples.clone(),
            ));
            self.sink = Some(sink);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_audio_reports_unsupported() {
        let mut audio = NoAudio;
        assert!(matches!(audio.start(), Err(LyricError::CaptureUnsupported)));
        assert!(!audio.is_recording());
        assert!(matches!(
            audio.play(&Clip::default()),
            Err(LyricError::CaptureUnsupported)
        ));
    }

    #[cfg(feature = "mic")]
    #[test]
    fn test_mic_stop_without_start() {
        let mut recorder = MicRecorder::new();
        assert!(!recorder.is_recording());
        assert!(matches!(recorder.stop(), Err(LyricError::CaptureFailed(_))));
        assert!(!recorder.is_recording());

        // 空片段不会打开输出设备
        assert!(recorder.play(&Clip::default()).is_ok());
    }
}
