use std::{fs::OpenOptions, io, mem, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{flock::Flock, options::SaveOptions};

/// One sampled boid at one point in time.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoidData {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub ax: f32,
    pub ay: f32,
    pub n_neighbours: usize,
    pub searching: bool,
    pub slowing: bool,
    /// sample index, ticks divided by the sample rate
    pub time: u64,
}

#[derive(Debug, Error)]
pub enum BirdwatcherError {
    #[error("can't open data file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("can't write data file: {0}")]
    Csv(#[from] csv::Error),
    #[error("can't flush data file: {0}")]
    Flush(#[from] io::Error),
}

/// Accumulates flock samples in memory until they are popped or saved.
pub struct Birdwatcher {
    locations: Vec<BoidData>,
    render_ticker: u64,
    sample_rate: u64,
}

const PREFIX: &str = "flock-data";

impl Birdwatcher {
    /// Samples every `sample_rate` ticks, 0 is treated as 1.
    pub fn new(sample_rate: u64) -> Self {
        Birdwatcher {
            locations: Vec::new(),
            render_ticker: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Counts a tick and records the flock when it is a sampling tick.
    pub fn watch(&mut self, flock: &Flock) {
        if !self.should_sample() {
            return;
        }

        let time = self.render_ticker / self.sample_rate;
        self.locations.extend(flock.view().map(|(boid, metadata)| {
            let position = boid.position();
            let velocity = boid.velocity();
            let acceleration = boid.acceleration();

            BoidData {
                id: boid.id,
                x: position.x,
                y: position.y,
                vx: velocity.x,
                vy: velocity.y,
                ax: acceleration.x,
                ay: acceleration.y,
                n_neighbours: metadata.n_neighbours,
                searching: boid.is_searching(),
                slowing: boid.slowing(),
                time,
            }
        }));
    }

    pub fn restart(&mut self) {
        self.locations.clear();
        self.render_ticker = 0;
    }

    pub fn pop_data(&mut self) -> Vec<BoidData> {
        mem::take(&mut self.locations)
    }

    /// Returns the collected data, emptying the birdwatcher, and writes it as
    /// CSV when the save options ask for it.
    ///
    /// Depending on the save options, either overwrites the current file or
    /// writes a new timestamped one. On error the data is lost.
    pub fn pop_data_save(
        &mut self,
        save_options: &SaveOptions,
    ) -> Result<Vec<BoidData>, BirdwatcherError> {
        let data = self.pop_data();

        if !save_options.save_locations {
            return Ok(data);
        }

        let path = save_options
            .save_locations_path
            .join(Birdwatcher::get_dataset_name(save_options, Utc::now()));

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| BirdwatcherError::Open {
                path: path.clone(),
                source,
            })?;

        let mut wtr = csv::Writer::from_writer(file);
        for record in data.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        info!(records = data.len(), path = %path.display(), "flock data saved");

        Ok(data)
    }

    fn get_dataset_name(save_options: &SaveOptions, now: DateTime<Utc>) -> String {
        match save_options.save_locations_timestamp {
            true => format!(
                "{prefix}_{datetime}.csv",
                prefix = PREFIX,
                datetime = now.timestamp_millis()
            ),
            false => format!("{prefix}.csv", prefix = PREFIX),
        }
    }

    fn should_sample(&mut self) -> bool {
        self.render_ticker += 1;
        self.render_ticker % self.sample_rate == 0
    }
}
