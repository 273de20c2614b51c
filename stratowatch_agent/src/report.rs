//! Terminal summary report for one rendered frame.

use stratowatch_core::overlay::OverlayKind;
use stratowatch_core::refresh::RenderFrame;

fn overlay_count(frame: &RenderFrame, pred: fn(&OverlayKind) -> bool) -> usize {
    frame.overlays.iter().filter(|o| pred(&o.kind)).count()
}

/// Prints the frame summary as a boxed terminal report.
pub fn print_frame(frame: &RenderFrame) {
    let insights = &frame.status.insights;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               STRATOWATCH CONSTELLATION REPORT               ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Updated:          {:<42} ║", frame.status.last_updated);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ FLIGHT                                                       ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Balloons:              {:>10}                            ║", insights.total_balloons);
    println!("║ Active:                {:>10}                            ║", insights.active_balloons);
    println!("║ Avg Speed:             {:>10.1} km/h                       ║", insights.avg_speed);
    println!(
        "║ Speed (lo/med/hi):     {:>10}                            ║",
        format!(
            "{}/{}/{}",
            insights.speed_distribution.low,
            insights.speed_distribution.medium,
            insights.speed_distribution.high
        )
    );
    println!("║ Constellation Links:   {:>10}                            ║", insights.constellation_links);

    if let Some(feed) = &frame.status.feed_insights {
        if feed.total_balloons != insights.total_balloons
            || feed.constellation_links != insights.constellation_links
        {
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ FEED DISAGREEMENT                                            ║");
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!(
                "║ Feed balloons/links:   {:>10}                            ║",
                format!("{}/{}", feed.total_balloons, feed.constellation_links)
            );
        }
    }

    if let Some(air) = &frame.status.air_quality {
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ AIR QUALITY                                                  ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ Stations:              {:>10}                            ║", air.station_count);
        println!("║ Avg AQI:               {:>10.1}                            ║", air.avg_aqi);
        if let Some(pm25) = air.avg_pm25 {
            println!("║ Avg PM2.5:             {:>10.1} µg/m³                      ║", pm25);
        }
    }

    if let Some(weather) = &frame.status.weather {
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ WEATHER                                                      ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ Stations:              {:>10}                            ║", weather.station_count);
        println!("║ Avg Temperature:       {:>10.1} °C                         ║", weather.avg_temperature);
        println!("║ Avg Wind:              {:>10.1} km/h                       ║", weather.avg_wind_speed);
    }

    if let Some(traffic) = &frame.status.air_traffic {
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ AIR TRAFFIC                                                  ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ Aircraft:              {:>10}                            ║", traffic.total_aircraft);
        println!("║ Near Misses:           {:>10}                            ║", traffic.near_misses);
        println!(
            "║ Risk (hi/med/lo):      {:>10}                            ║",
            format!("{}/{}/{}", traffic.high_risk, traffic.medium_risk, traffic.low_risk)
        );
    }

    let markers = overlay_count(frame, |k| matches!(k, OverlayKind::BalloonMarker { .. }));
    let lines = overlay_count(frame, |k| matches!(k, OverlayKind::ConstellationLine { .. }));
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║ Overlays:              {:>10}  ({} markers, {} lines)",
        frame.overlays.len(),
        markers,
        lines
    );
    println!("╚══════════════════════════════════════════════════════════════╝");
}
