//! Audio playback using rodio

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use log::{debug, info, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::{
    alarm::AlarmId,
    error::{AudioError, AudioResult},
};

/// Lazily opened output device. `OutputStream` has to outlive every sink
/// created from its handle.
#[derive(Default)]
struct Output {
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl Output {
    fn handle(&mut self) -> AudioResult<&OutputStreamHandle> {
        if self.stream.is_none() {
            let stream =
                OutputStream::try_default().map_err(|e| AudioError::Output(e.to_string()))?;
            info!("audio output opened");
            self.stream = Some(stream);
        }
        self.stream
            .as_ref()
            .map(|(_, handle)| handle)
            .ok_or_else(|| AudioError::Output("no output stream".to_string()))
    }

    fn sink(&mut self) -> AudioResult<Sink> {
        Sink::try_new(self.handle()?).map_err(|e| AudioError::Output(e.to_string()))
    }
}

fn decode(path: &Path) -> AudioResult<Decoder<BufReader<File>>> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode(e.to_string()))
}

/// Rings fired alarms until they are stopped.
#[derive(Default)]
pub struct Ringer {
    output: Output,
    ringing: HashMap<AlarmId, Sink>,
}

impl Ringer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plays `sound` on repeat. Ringing the same alarm again restarts it.
    ///
    /// # Errors
    /// if the file is missing or undecodable, or there is no output device
    pub fn ring(&mut self, id: &AlarmId, sound: &Path) -> AudioResult<()> {
        self.stop(id);
        let source = decode(sound)?.repeat_infinite();
        let sink = self.output.sink()?;
        sink.append(source);
        sink.play();
        info!("alarm {id} ringing with {}", sound.display());
        self.ringing.insert(id.clone(), sink);
        Ok(())
    }

    pub fn stop(&mut self, id: &AlarmId) {
        if let Some(sink) = self.ringing.remove(id) {
            info!("alarm {id} stopped");
            sink.stop();
        }
    }

    #[must_use]
    pub fn is_ringing(&self, id: &AlarmId) -> bool {
        self.ringing.contains_key(id)
    }
}

/// Plays the selected sound once so the user can hear it before saving.
/// Holds at most one sink; starting a new preview stops the old one.
#[derive(Default)]
pub struct Preview {
    output: Output,
    sink: Option<Sink>,
}

impl Preview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file is missing or undecodable, or there is no output device
    pub fn play(&mut self, sound: &Path) -> AudioResult<()> {
        self.stop();
        let source = decode(sound)?;
        let sink = self.output.sink()?;
        sink.append(source);
        debug!("previewing {}", sound.display());
        self.sink = Some(sink);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// false once playback finished on its own
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        if self.is_playing() {
            warn!("preview still playing when released, stopping it");
        }
        self.stop();
    }
}
