use tinymovr::can::AsyncCanAdapter;
use tinymovr::client::Tinymovr;
use tinymovr::sim::SimulatedDevice;
use tracing_subscriber;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let adapter = AsyncCanAdapter::new(SimulatedDevice::new(1));
    let mut tm = Tinymovr::from_node_id(&adapter, 1);

    tm.detect_firmware().await.unwrap();
    println!("{}", tm.device_info().await.unwrap());

    tm.calibrate().await.unwrap();
    tm.velocity_control().await.unwrap();
    tm.write("set_vel_setpoint", &[("velocity", 20000.0.into())])
        .await
        .unwrap();

    println!("{:?}", tm.state().await.unwrap());
    println!("{}", tm.read("encoder_estimates").await.unwrap());
    println!("{}", tm.read("Iq").await.unwrap());

    tm.idle().await.unwrap();
}
