use std::io::BufRead as _;

use tokio::sync::mpsc;

/// Read lines from stdin on a dedicated thread, so the blocking terminal
/// read never stalls connection I/O. The channel closes when stdin does.
pub fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Print the prompt and flush so it appears before the terminal blocks on
/// the next line.
pub fn prompt() {
    use std::io::Write as _;
    print!("> ");
    let _ = std::io::stdout().flush();
}
