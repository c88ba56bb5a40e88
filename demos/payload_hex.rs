//! Print a movement command and its payload in the hex form used by external
//! command tooling.

use cfs_movement::protocol::{CommandConfig, MovementCommand, Position};

fn main() {
    println!("Movement Command Encoding");
    println!("=========================\n");

    for position in [
        Position::new(1.5, 2.7, 3.9),
        Position::new(-10.123, 25.456, 0.0),
    ] {
        let command = MovementCommand::now(&CommandConfig::default(), position);
        let encoded = command.encode();

        println!("{position}");
        println!("  command size: {} bytes", encoded.len());
        println!("  function code: {}", command.header().function_code());
        println!("  payload: {}\n", position.payload_hex());
    }
}
