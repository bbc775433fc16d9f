use pdftext::PdfReader;
use std::process;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("Usage: pdftext <input.pdf>");
            process::exit(1);
        }
    };

    let mut reader = match PdfReader::open(&path) {
        Ok(reader) => reader,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            process::exit(1);
        }
    };

    match reader.extract_text() {
        Ok(text) => print!("{}", text),
        Err(err) => {
            eprintln!("{}: {}", path, err);
            process::exit(1);
        }
    }
}
