//! Sample Data Generator
//!
//! Writes a synthetic restaurant CSV in the upload format, optionally seeded
//! with rows whose rating cannot be parsed.

use rand::Rng;
use tracing::info;

const COLUMNS: [&str; 7] = [
    "name",
    "online_order",
    "book_table",
    "rate",
    "votes",
    "location",
    "listed_in(type)",
];

/// Listing types the fitted `listed_in(type)` encoder knows.
const LISTED_IN_TYPES: [&str; 7] = [
    "Buffet",
    "Cafes",
    "Delivery",
    "Desserts",
    "Dine-out",
    "Drinks & nightlife",
    "Pubs and bars",
];

/// Restaurant row generator for testing
struct RestaurantGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl RestaurantGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    /// Generate a row the pipeline accepts
    fn generate_valid(&mut self) -> Vec<String> {
        let rate = format!("{:.1}/5", self.rng.gen_range(2.0..5.0));
        self.generate_with_rate(rate)
    }

    /// Generate a row whose rating has no decimal number in it
    fn generate_invalid(&mut self) -> Vec<String> {
        let rate = self.random_choice(&["NEW", "-", "4/5"]).to_string();
        self.generate_with_rate(rate)
    }

    fn generate_with_rate(&mut self, rate: String) -> Vec<String> {
        self.counter += 1;
        vec![
            format!(
                "{} {}",
                self.random_choice(&["Spice", "Cafe", "Jalsa", "Onesta", "Empire", "Truffles"]),
                self.counter
            ),
            self.random_choice(&["Yes", "No"]).to_string(),
            self.random_choice(&["Yes", "No"]).to_string(),
            rate,
            self.rng.gen_range(0..5000).to_string(),
            self.random_choice(&["Banashankari", "Basavanagudi", "Jayanagar", "Koramangala"])
                .to_string(),
            self.random_choice(&LISTED_IN_TYPES).to_string(),
        ]
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_data=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let output = args.get(2).map(|s| s.as_str()).unwrap_or("restaurants.csv");
    let invalid_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0_f64)
        .clamp(0.0, 1.0);

    info!(count = count, output = %output, invalid_rate = invalid_rate, "Configuration loaded");

    let mut generator = RestaurantGenerator::new();
    let mut rng = rand::thread_rng();
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(COLUMNS)?;

    let mut invalid_count = 0;
    for _ in 0..count {
        let row = if rng.gen_bool(invalid_rate) {
            invalid_count += 1;
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} rows to {} ({} with unparseable rates)",
        count, output, invalid_count
    );

    Ok(())
}
