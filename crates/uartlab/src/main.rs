fn main() {
    env_logger::init();

    let options = uartlab::parse_args(std::env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err:#}");
        eprintln!("{}", uartlab::USAGE);
        std::process::exit(2);
    });

    let report = uartlab::run(&options).unwrap_or_else(|err| {
        eprintln!("Simulation failed: {err:#}");
        std::process::exit(1);
    });

    let frame: String = report
        .frame
        .levels()
        .iter()
        .map(|b| char::from(b'0' + b))
        .collect();
    println!(
        "Frame for 0x{:02X} ({:?} parity, {} bits): {}",
        options.byte,
        options.parity,
        report.frame.len(),
        frame
    );

    match report.received {
        Some(received) => println!(
            "Received 0x{:02X} after {} ticks: frame_error={} parity_error={}",
            received.byte,
            report.ticks,
            received.errors.frame_error(),
            received.errors.parity_error()
        ),
        None => println!("Receiver did not complete a frame in {} ticks", report.ticks),
    }
    if report.false_starts > 0 {
        println!("False starts: {}", report.false_starts);
    }
    println!();
    print!("{}", report.waveform);
}
