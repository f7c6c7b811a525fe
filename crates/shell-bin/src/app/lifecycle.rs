//! Shell lifecycle queries.

use bridge_ipc::BridgeClient;
use host_relay::read_pid_file;
use shell_config::Paths;

/// Check whether a shell instance is running.
pub async fn check_status(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let instance_socket = paths.instance_socket();

    let client = BridgeClient::new(&instance_socket);
    if client.is_listening().await {
        println!("Shell is running");
        if let Ok(pid) = read_pid_file(&paths.pid_file()) {
            println!("  PID:    {}", pid);
        }
        println!("  Socket: {}", instance_socket.display());
    } else {
        println!("Shell is not running");
    }

    Ok(())
}
