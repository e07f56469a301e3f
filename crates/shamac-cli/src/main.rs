use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use shamac_core::{Digest, DIGEST_LEN};
use shamac_crypto::{hmac, sha256};
use std::fs;
use std::io::{self, Read};

/// Name printed for stdin input, as sha256sum does.
const STDIN_NAME: &str = "-";

#[derive(Parser, Debug)]
#[command(
    name = "shamac",
    about = "Compute SHA-256 digests or HMAC-SHA256 tags"
)]
struct Args {
    /// Files to hash ("-" for stdin). Reads stdin when no files or --text are given
    #[arg()]
    files: Vec<String>,

    /// Hash this string instead of reading files
    #[arg(short = 't', long = "text", conflicts_with = "files")]
    text: Option<String>,

    /// HMAC key as a UTF-8 string
    #[arg(short = 'k', long = "key", conflicts_with = "key_hex")]
    key: Option<String>,

    /// HMAC key as hex
    #[arg(long = "key-hex")]
    key_hex: Option<String>,

    /// Truncate output to this many bytes (1-32)
    #[arg(short = 'l', long = "len", default_value_t = DIGEST_LEN)]
    len: usize,

    /// Expected output as hex (may be truncated); exit 1 on mismatch
    #[arg(short = 'c', long = "check")]
    check: Option<String>,

    /// Print input length and padded block count to stderr
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

/// One named input to hash.
struct Input {
    name: String,
    data: Vec<u8>,
}

fn validate_len(len: usize) -> Result<usize, String> {
    if len == 0 {
        return Err("--len must be at least 1".to_string());
    }
    if len > DIGEST_LEN {
        return Err(format!(
            "--len {} exceeds digest size of {} bytes",
            len, DIGEST_LEN
        ));
    }
    Ok(len)
}

/// Resolve the HMAC key, if any.
fn parse_key(args: &Args) -> Result<Option<Vec<u8>>, String> {
    match (&args.key, &args.key_hex) {
        (Some(key), _) => Ok(Some(key.as_bytes().to_vec())),
        (None, Some(hex_key)) => hex::decode(hex_key.trim())
            .map(Some)
            .map_err(|e| format!("invalid --key-hex '{}': {}", hex_key, e)),
        (None, None) => Ok(None),
    }
}

/// Parse an expected value for --check. It must be no longer than --len.
fn parse_check(check: &str, len: usize) -> Result<Vec<u8>, String> {
    let expected = Digest::decode_prefix(check)
        .map_err(|e| format!("invalid --check value '{}': {}", check, e))?;
    if expected.len() > len {
        return Err(format!(
            "--check value has {} bytes, expected 1 to {}",
            expected.len(),
            len
        ));
    }
    Ok(expected)
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .read_to_end(&mut data)
        .context("failed to read stdin")?;
    Ok(data)
}

fn collect_inputs(args: &Args) -> Result<Vec<Input>> {
    if let Some(text) = &args.text {
        return Ok(vec![Input {
            name: format!("\"{}\"", text),
            data: text.as_bytes().to_vec(),
        }]);
    }

    if args.files.is_empty() {
        return Ok(vec![Input {
            name: STDIN_NAME.to_string(),
            data: read_stdin()?,
        }]);
    }

    // Stdin is read once, up front, so the parallel reads below only touch files.
    let stdin_data = if args.files.iter().any(|name| name == STDIN_NAME) {
        read_stdin()?
    } else {
        Vec::new()
    };

    let file_data: Vec<Option<Vec<u8>>> = args
        .files
        .par_iter()
        .map(|name| {
            if name == STDIN_NAME {
                Ok(None)
            } else {
                fs::read(name)
                    .with_context(|| format!("failed to read '{}'", name))
                    .map(Some)
            }
        })
        .collect::<Result<_>>()?;

    let inputs = args
        .files
        .iter()
        .zip(file_data)
        .map(|(name, data)| Input {
            name: name.clone(),
            data: data.unwrap_or_else(|| stdin_data.clone()),
        })
        .collect();
    Ok(inputs)
}

fn compute(key: Option<&[u8]>, data: &[u8]) -> Digest {
    match key {
        Some(key) => Digest::from(hmac::hmac_sha256(key, data)),
        None => Digest::from(sha256::digest(data)),
    }
}

/// Constant-time match of an expected (possibly truncated) value.
fn check_output(output: &Digest, expected: &[u8]) -> bool {
    output.ct_eq_prefix(expected)
}

/// Output lines in argument order, and whether any check failed.
fn report(
    inputs: &[Input],
    outputs: &[Digest],
    len: usize,
    expected: Option<&[u8]>,
) -> (Vec<String>, bool) {
    let mut mismatched = false;
    let lines = inputs
        .iter()
        .zip(outputs)
        .map(|(input, output)| match expected {
            Some(expected) => {
                let ok = check_output(output, expected);
                mismatched |= !ok;
                format!("{}: {}", input.name, if ok { "OK" } else { "FAILED" })
            }
            None => format!("{}  {}", hex::encode(output.prefix(len)), input.name),
        })
        .collect();
    (lines, mismatched)
}

fn main() {
    let args = Args::parse();

    let len = match validate_len(args.len) {
        Ok(len) => len,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };

    let key = match parse_key(&args) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };

    let expected = match args.check.as_deref().map(|c| parse_check(c, len)).transpose() {
        Ok(expected) => expected,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };

    let inputs = match collect_inputs(&args) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    };

    let outputs: Vec<Digest> = inputs
        .par_iter()
        .map(|input| compute(key.as_deref(), &input.data))
        .collect();

    if args.verbose {
        for input in &inputs {
            eprintln!(
                "{}: {} bytes, {} block(s)",
                input.name,
                input.data.len(),
                sha256::block_count(input.data.len())
            );
        }
    }

    let (lines, mismatched) = report(&inputs, &outputs, len, expected.as_deref());
    for line in lines {
        println!("{}", line);
    }

    if mismatched {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_validator() {
        assert_eq!(validate_len(1), Ok(1));
        assert_eq!(validate_len(32), Ok(32));
        assert!(validate_len(0).is_err());
        assert!(validate_len(33).is_err());
    }

    #[test]
    fn test_check_parser() {
        assert_eq!(parse_check("ABCD", 32), Ok(vec![0xab, 0xcd]));
        assert!(parse_check("abc", 32).is_err()); // odd length
        assert!(parse_check("xyz0", 32).is_err());
        assert!(parse_check("", 32).is_err());
        // Longer than the requested output
        assert!(parse_check("00112233", 2).is_err());
    }

    #[test]
    fn test_key_parsing() {
        let args = Args::parse_from(["shamac", "--key-hex", "0b0b"]);
        assert_eq!(parse_key(&args), Ok(Some(vec![0x0b, 0x0b])));

        let args = Args::parse_from(["shamac", "--key", "Jefe"]);
        assert_eq!(parse_key(&args), Ok(Some(b"Jefe".to_vec())));

        let args = Args::parse_from(["shamac", "--key-hex", "zz"]);
        assert!(parse_key(&args).is_err());

        let args = Args::parse_from(["shamac"]);
        assert_eq!(parse_key(&args), Ok(None));
    }

    #[test]
    fn test_key_options_conflict() {
        assert!(Args::try_parse_from(["shamac", "--key", "a", "--key-hex", "00"]).is_err());
        assert!(Args::try_parse_from(["shamac", "--text", "a", "file.txt"]).is_err());
    }

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const RFC4231_CASE1: &str = "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7";

    fn input(name: &str, data: &[u8]) -> Input {
        Input {
            name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_compute_digest_and_hmac() {
        assert_eq!(compute(None, b"abc").to_hex(), ABC_SHA256);
        assert_eq!(
            compute(Some(&[0x0bu8; 20][..]), b"Hi There").to_hex(),
            RFC4231_CASE1
        );
    }

    #[test]
    fn test_check_output_unkeyed() {
        let output = compute(None, b"abc");
        assert!(check_output(&output, &parse_check(ABC_SHA256, 32).unwrap()));
        // Truncated expected value matches the prefix
        assert!(check_output(&output, &parse_check("ba7816bf", 32).unwrap()));
        assert!(!check_output(&output, &parse_check("ba7816be", 32).unwrap()));
    }

    #[test]
    fn test_check_output_keyed() {
        let key = [0x0bu8; 20];
        let output = compute(Some(&key[..]), b"Hi There");
        assert!(check_output(&output, &parse_check(RFC4231_CASE1, 32).unwrap()));
        assert!(check_output(&output, &parse_check(&RFC4231_CASE1[..32], 16).unwrap()));
        // The unkeyed digest of the same data must not pass a keyed check
        let unkeyed = compute(None, b"Hi There");
        assert!(!check_output(&unkeyed, &parse_check(RFC4231_CASE1, 32).unwrap()));
    }

    #[test]
    fn test_report_prints_truncated_hex() {
        let inputs = [input("a.txt", b"abc")];
        let outputs = [compute(None, b"abc")];
        let (lines, mismatched) = report(&inputs, &outputs, 4, None);
        assert_eq!(lines, vec!["ba7816bf  a.txt".to_string()]);
        assert!(!mismatched);
    }

    #[test]
    fn test_report_check_lines_and_failure_flag() {
        let inputs = [input("good", b"abc"), input("bad", b"abd")];
        let outputs = [compute(None, b"abc"), compute(None, b"abd")];
        let expected = parse_check(ABC_SHA256, 32).unwrap();

        let (lines, mismatched) = report(&inputs, &outputs, 32, Some(expected.as_slice()));
        assert_eq!(lines, vec!["good: OK".to_string(), "bad: FAILED".to_string()]);
        assert!(mismatched);

        let (lines, mismatched) = report(&inputs[..1], &outputs[..1], 32, Some(expected.as_slice()));
        assert_eq!(lines, vec!["good: OK".to_string()]);
        assert!(!mismatched);
    }

    #[test]
    fn test_files_keep_argument_order() {
        let dir = std::env::temp_dir().join(format!("shamac-order-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let first = dir.join("first.txt");
        let second = dir.join("second.txt");
        fs::write(&first, b"abc").unwrap();
        fs::write(&second, b"second file contents").unwrap();

        let first = first.to_string_lossy().into_owned();
        let second = second.to_string_lossy().into_owned();
        let args = Args::parse_from(["shamac", second.as_str(), first.as_str()]);
        let inputs = collect_inputs(&args).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, second);
        assert_eq!(inputs[0].data, b"second file contents");
        assert_eq!(inputs[1].name, first);
        assert_eq!(inputs[1].data, b"abc");

        let outputs: Vec<Digest> = inputs.iter().map(|i| compute(None, &i.data)).collect();
        let (lines, _) = report(&inputs, &outputs, 32, None);
        assert_eq!(lines[1], format!("{}  {}", ABC_SHA256, first));
    }

    #[test]
    fn test_text_input() {
        let args = Args::parse_from(["shamac", "--text", "abc"]);
        let inputs = collect_inputs(&args).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].data, b"abc");
        assert_eq!(inputs[0].name, "\"abc\"");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let args = Args::parse_from(["shamac", "/nonexistent/shamac-test-input"]);
        let err = collect_inputs(&args).err().unwrap();
        assert!(format!("{:#}", err).contains("/nonexistent/shamac-test-input"));
    }
}
