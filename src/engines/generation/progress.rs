use super::population::GenerationStats;
use std::sync::mpsc::Sender;

/// Receives reporting events from the evolution loop. Reports never feed
/// back into the search.
pub trait ProgressCallback: Send {
    fn on_initialized(&mut self, population_size: usize);
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_generation_complete(&mut self, stats: &GenerationStats);
}

pub fn format_initialized(population_size: usize) -> String {
    format!("Initialized population of {} individuals", population_size)
}

/// `Iteration <i>: Best: <b>  Average: <a>`
pub fn format_generation(stats: &GenerationStats) -> String {
    format!(
        "Iteration {}: Best: {:.2}  Average: {:.2}",
        stats.generation,
        f64::from(stats.best_score),
        stats.average_score
    )
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_initialized(&mut self, population_size: usize) {
        println!("{}", format_initialized(population_size));
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        println!("{}", format_generation(stats));
    }
}

/// Routes progress lines through the `log` facade at info level.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_initialized(&mut self, population_size: usize) {
        log::info!("{}", format_initialized(population_size));
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        log::info!("{}", format_generation(stats));
    }
}

/// Discards every report.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_initialized(&mut self, _population_size: usize) {}

    fn on_generation_complete(&mut self, _stats: &GenerationStats) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Initialized { population_size: usize },
    GenerationStart(usize),
    GenerationComplete(GenerationStats),
}

/// Sends reports over a channel so a consumer thread can render them
/// without blocking the loop.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_initialized(&mut self, population_size: usize) {
        let _ = self
            .sender
            .send(ProgressMessage::Initialized { population_size });
    }

    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, stats: &GenerationStats) {
        let _ = self
            .sender
            .send(ProgressMessage::GenerationComplete(stats.clone()));
    }
}
