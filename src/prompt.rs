use crate::cipher;
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

fn read_answer<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<String> {
    write!(out, "{}", question)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("Input closed before an answer was given"));
    }
    Ok(line.trim().to_string())
}

/// Asks for an image path until the answer names an existing file.
pub fn prompt_image_path<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<PathBuf> {
    loop {
        let answer = read_answer(input, out, "Enter image path (absolute or relative): ")?;
        let path = PathBuf::from(answer);
        if path.is_file() {
            return Ok(path);
        }
        writeln!(out, "Invalid image path. Please enter a valid path.")?;
    }
}

pub fn prompt_key<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<i64> {
    let answer = read_answer(input, out, "Enter secret key: ")?;
    cipher::parse_key(&answer).context("Secret key must be an integer")
}
