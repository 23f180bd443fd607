use std::io::{self, BufRead, Write};

use anyhow::Context as _;

/// Asks for the work URL on stdin when none was passed on the command line.
pub fn work_url(site_host: &str) -> anyhow::Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    ask(
        &mut input,
        &mut output,
        &format!("Enter the URL of the novel from {site_host}: "),
    )
    .context("read work url from stdin")
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> anyhow::Result<String> {
    output.write_all(question.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        anyhow::bail!("no URL given");
    }
    Ok(answer.to_owned())
}
