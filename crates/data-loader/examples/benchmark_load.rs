use data_loader::Dataset;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data");

    println!("Loading tourism dataset...\n");

    let start = Instant::now();
    let dataset = Dataset::load_from_files(data_dir).expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (users, items, transactions) = dataset.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Attractions: {}", items);
    println!("Transactions: {}", transactions);
    println!("Unknown attractions: {}", dataset.unknown_attractions().len());
    println!(
        "\nPerformance: {:.0} transactions/second",
        transactions as f64 / elapsed.as_secs_f64()
    );
}
