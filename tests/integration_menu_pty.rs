// Drives the compiled binary through a PTY: menu, skipper loop, raw-mode
// quit key and back to the menu.
//
// Notes:
// - Requires a TTY and, for the skipper loop, an input backend with
//   access to the display; expectrl allocates the pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_menu_pty -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn menu_to_skipper_and_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("dialogue-skipper");
    let cmd = format!(
        "{} --no-elevate --config {} --log-file {}",
        bin.display(),
        dir.path().join("config.json").display(),
        dir.path().join("skipper.log").display()
    );

    let mut p = spawn(cmd)?;
    p.expect("Enter choice (1-6):")?;

    // start the skipper, leave it again with q
    p.send_line("1")?;
    p.expect("Status: Ready")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("q")?;

    p.expect("Enter choice (1-6):")?;
    p.send_line("6")?;
    p.expect(Eof)?;
    Ok(())
}
