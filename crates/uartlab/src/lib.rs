use anyhow::{anyhow, bail, Context, Result};
use uartlab_core::{
    Frame, History, LineFault, ParityMode, Received, SimConfig, Simulation, WaveformEntry,
};

pub const USAGE: &str = "Usage: uartlab <byte> [--parity none|even|odd] [--drift <percent>] \
[--noise <probability>] [--seed <n>] [--flip <bit>] [--force-low <bit>] [--force-high <bit>]";

/// Bit periods allowed for one frame before giving up.
const MAX_BAUD_TICKS: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub byte: u8,
    pub parity: ParityMode,
    pub drift_percent: f32,
    pub noise: f64,
    pub seed: u64,
    pub faults: Vec<LineFault>,
}

/// Parse command-line arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<RunOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut byte = None;
    let mut options = RunOptions {
        byte: 0,
        parity: ParityMode::None,
        drift_percent: 0.0,
        noise: 0.0,
        seed: 0,
        faults: Vec::new(),
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("missing value for '{flag}'"))
        };
        match arg.as_str() {
            "--parity" | "-p" => options.parity = value(&arg)?.parse()?,
            "--drift" | "-d" => {
                options.drift_percent = value(&arg)?
                    .parse()
                    .context("drift must be a number of percent")?
            }
            "--noise" => {
                options.noise = value(&arg)?
                    .parse()
                    .context("noise must be a probability")?
            }
            "--seed" => options.seed = value(&arg)?.parse().context("seed must be an integer")?,
            "--flip" => options.faults.push(LineFault::Flip(parse_index(&value(&arg)?)?)),
            "--force-low" => options
                .faults
                .push(LineFault::ForceLow(parse_index(&value(&arg)?)?)),
            "--force-high" => options
                .faults
                .push(LineFault::ForceHigh(parse_index(&value(&arg)?)?)),
            other if other.starts_with("--") => bail!("unknown option '{other}'"),
            other => {
                if byte.is_some() {
                    bail!("unexpected argument '{other}'");
                }
                byte = Some(parse_byte(other)?);
            }
        }
    }

    options.byte = byte.ok_or_else(|| anyhow!("missing byte to transmit"))?;
    Ok(options)
}

/// Accepts `0x41`, `0b1000001`, `65` or a single character such as `A`.
pub fn parse_byte(s: &str) -> Result<u8> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        s.parse()
    } else {
        let mut chars = s.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Ok(c as u8),
            _ => bail!("'{s}' is not a byte"),
        };
    };
    parsed.with_context(|| format!("'{s}' is not a byte"))
}

fn parse_index(s: &str) -> Result<usize> {
    s.parse()
        .with_context(|| format!("'{s}' is not a frame bit index"))
}

pub struct Report {
    pub frame: Frame,
    pub received: Option<Received>,
    pub false_starts: u64,
    pub ticks: u64,
    pub waveform: String,
}

/// Transmit one frame with the given options and collect the outcome.
pub fn run(options: &RunOptions) -> Result<Report> {
    let config = SimConfig::builder()
        .parity(options.parity)
        .drift_percent(options.drift_percent)
        .noise(options.noise)
        .seed(options.seed)
        .history_capacity(MAX_BAUD_TICKS * 16)
        .build();
    let mut sim = Simulation::new(config)?;
    for &fault in &options.faults {
        sim.inject_fault(fault)?;
    }
    sim.load_byte(options.byte)?;
    sim.start_transmit()?;
    let frame = *sim
        .frame()
        .ok_or_else(|| anyhow!("transmitter did not load a frame"))?;
    log::info!("Transmitting 0x{:02X} as {:?}", options.byte, frame.levels());

    let received = sim.run_frame(MAX_BAUD_TICKS);
    if received.is_none() {
        log::warn!("Receiver did not finish within {MAX_BAUD_TICKS} bit periods");
    }

    Ok(Report {
        frame,
        received,
        false_starts: sim.false_starts(),
        ticks: sim.tick(),
        waveform: render_waveform(sim.waveform_history()),
    })
}

/// Text waveform, one column per oversample tick.
pub fn render_waveform(history: &History) -> String {
    let rows: [(&str, fn(&WaveformEntry) -> char); 6] = [
        ("tx_out ", |e| level(e.tx_out())),
        ("tx_busy", |e| level(e.tx_busy())),
        ("rx_samp", |e| if e.rx_sampling() { '^' } else { ' ' }),
        ("rx_data", |e| level(e.rx_data())),
        ("rx_done", |e| level(e.rx_done())),
        ("rx_err ", |e| level(e.rx_error())),
    ];

    let mut out = String::new();
    for (name, glyph) in rows {
        out.push_str(name);
        out.push_str(" |");
        out.extend(history.iter().map(glyph));
        out.push('\n');
    }
    out
}

fn level(high: bool) -> char {
    if high {
        '-'
    } else {
        '_'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_byte_forms() {
        assert_eq!(parse_byte("0x41").unwrap(), 0x41);
        assert_eq!(parse_byte("65").unwrap(), 65);
        assert_eq!(parse_byte("0b1000001").unwrap(), 0x41);
        assert_eq!(parse_byte("A").unwrap(), b'A');
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("AB").is_err());
        assert!(parse_byte("").is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let options = parse_args(args(&[
            "0x41", "--parity", "even", "--drift", "-2.5", "--seed", "9", "--flip", "9",
        ]))
        .unwrap();
        assert_eq!(options.byte, 0x41);
        assert_eq!(options.parity, ParityMode::Even);
        assert_eq!(options.drift_percent, -2.5);
        assert_eq!(options.seed, 9);
        assert_eq!(options.faults, vec![LineFault::Flip(9)]);
    }

    #[test]
    fn rejects_bad_command_lines() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["0x41", "--parity"])).is_err());
        assert!(parse_args(args(&["0x41", "--parity", "mark"])).is_err());
        assert!(parse_args(args(&["0x41", "0x42"])).is_err());
        assert!(parse_args(args(&["0x41", "--baud", "9600"])).is_err());
    }

    #[test]
    fn run_reports_received_byte_and_waveform() {
        let options = parse_args(args(&["A", "--parity", "odd"])).unwrap();
        let report = run(&options).unwrap();
        assert_eq!(report.frame.levels(), vec![0, 1, 0, 0, 0, 0, 0, 1, 0, 1, 1]);
        let received = report.received.unwrap();
        assert_eq!(received.byte, b'A');
        assert!(received.errors.is_empty());

        let lines: Vec<&str> = report.waveform.lines().collect();
        assert_eq!(lines.len(), 6);
        let width = "tx_out  |".len() + report.ticks as usize;
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert_eq!(lines[2].matches('^').count(), 11);
    }

    #[test]
    fn run_surfaces_injected_frame_error() {
        let options = parse_args(args(&["0x00", "--force-low", "9"])).unwrap();
        let report = run(&options).unwrap();
        assert!(report.received.unwrap().errors.frame_error());
    }

    #[test]
    fn run_rejects_out_of_range_drift() {
        let options = parse_args(args(&["0x10", "--drift", "12"])).unwrap();
        assert!(run(&options).is_err());
    }
}
