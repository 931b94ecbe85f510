use std::env;

use daikin_aircon::{DaikinClient, Temperature};

#[tokio::main]
async fn main() -> daikin_aircon::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let Some(host) = args.get(1) else {
        eprintln!("usage: status <host> [target-celsius]");
        std::process::exit(2);
    };

    let mut client = DaikinClient::builder(host).build()?;
    let info = client.connect().await?;
    println!("{} ({})", info.name, info.mac);

    let sensor = client.sensor_info().await?;
    print!("indoor {}", sensor.indoor_temperature);
    match sensor.outdoor_temperature {
        Some(t) => println!(" | outdoor {t}"),
        None => println!(" | outdoor n/a"),
    }

    let mut control = client.control_info().await?;
    println!(
        "power: {} | mode: {:?} | target: {:?} | fan: {:?} / {:?}",
        control.power(),
        control.mode(),
        control.target_temperature(),
        control.fan_rate(),
        control.fan_direction(),
    );

    if let Some(target) = args.get(2).and_then(|s| s.parse::<f64>().ok()) {
        control.set_target_temperature(Temperature::from_celsius(target))?;
        client.set_control_info(&mut control).await?;
        println!("target set to {}", Temperature::from_celsius(target));
    }

    Ok(())
}
