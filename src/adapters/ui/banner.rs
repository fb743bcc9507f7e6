//! ASCII banner with gradient (RATEBOOK).
//! Uses figlet's bundled standard font.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::ExecutableCommand;
use figlet_rs::FIGfont;
use std::io::{stdout, Write};

/// Ledger Teal (#0fb89b).
const LEDGER_TEAL: (u8, u8, u8) = (0x0f, 0xb8, 0x9b);
/// Invoice Amber (#f5a623).
const INVOICE_AMBER: (u8, u8, u8) = (0xf5, 0xa6, 0x23);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints the welcome banner: "RATEBOOK" in figlet ASCII with a gradient
/// from Ledger Teal to Invoice Amber, then version.
pub fn print_welcome() {
    let mut out = stdout();
    let Ok(font) = FIGfont::standard() else {
        let _ = writeln!(out, "RATEBOOK");
        return;
    };
    let Some(figure) = font.convert("RATEBOOK") else {
        let _ = writeln!(out, "RATEBOOK");
        return;
    };
    let art = figure.to_string();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(LEDGER_TEAL, INVOICE_AMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: INVOICE_AMBER.0,
        g: INVOICE_AMBER.1,
        b: INVOICE_AMBER.2,
    }));
    let _ = out.execute(Print(format!("v{version}\r\n")));
    let _ = out.execute(Print("Purchase rates, trends & ledger reconciliation\r\n"));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp_rgb((0, 0, 0), (255, 255, 255), 0.0), (0, 0, 0));
        assert_eq!(lerp_rgb((0, 0, 0), (255, 255, 255), 1.0), (255, 255, 255));
    }

    #[test]
    fn lerp_midpoint_rounds() {
        assert_eq!(lerp_rgb((0, 0, 0), (255, 255, 255), 0.5), (128, 128, 128));
    }
}
