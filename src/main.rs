use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sillage::cli::main()
}
