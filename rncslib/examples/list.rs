use rncslib::{schema::SchemaTable, walk};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: перечислить биланы каталога с пустой схемой
    let root = std::env::args().nth(1).unwrap_or_else(|| ".".into());
    let schema = SchemaTable::new();
    for bilan in walk(&root, &schema) {
        println!("{}\t{}\t{} warnings", bilan.reference, bilan.siren, bilan.report.len());
    }
    Ok(())
}
