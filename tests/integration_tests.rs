// Integration tests for Closest Relays

use closest_relays::core::{
    catalog::parse_directory,
    prober::{LatencyProber, PingError, Pinger, ProbeSettings},
    RelayFinder,
};
use closest_relays::models::{Coordinate, ProbeResult, ProtocolType};
use closest_relays::{order, rank, table};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// Pinger answering from a fixed table; unknown addresses never answer
struct TablePinger {
    replies: HashMap<IpAddr, Result<u64, &'static str>>,
}

impl TablePinger {
    fn new(replies: &[(&str, Result<u64, &'static str>)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(ip, reply)| (ip.parse().unwrap(), *reply))
                .collect(),
        }
    }
}

impl Pinger for TablePinger {
    async fn ping(&self, address: IpAddr, _timeout: Duration) -> Result<Duration, PingError> {
        match self.replies.get(&address) {
            Some(Ok(ms)) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(Duration::from_millis(*ms))
            }
            Some(Err(reason)) => Err(PingError::Unreachable(reason.to_string())),
            None => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(PingError::TimedOut)
            }
        }
    }
}

fn settings(timeout_ms: u64) -> ProbeSettings {
    ProbeSettings {
        timeout: Duration::from_millis(timeout_ms),
        concurrency: 8,
        batch_deadline: None,
    }
}

fn origin(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

const DIRECTORY: &str = r#"{
  "countries": [
    {
      "name": "Germany",
      "code": "de",
      "cities": [
        {
          "name": "Berlin",
          "code": "ber",
          "latitude": 52.52,
          "longitude": 13.405,
          "relays": [
            { "hostname": "de-ber-wg-001", "ipv4_addr_in": "10.1.0.1", "endpoint_data": { "wireguard": { "public_key": "x" } } },
            { "hostname": "de-ber-wg-002", "ipv4_addr_in": "10.1.0.2", "endpoint_data": { "wireguard": {} } },
            { "hostname": "de-ber-ovpn-001", "ipv4_addr_in": "10.1.0.3", "endpoint_data": "openvpn" }
          ]
        },
        {
          "name": "Frankfurt",
          "code": "fra",
          "latitude": 50.1109,
          "longitude": 8.6821,
          "relays": [
            { "hostname": "de-fra-wg-001", "ipv4_addr_in": "10.2.0.1", "endpoint_data": { "wireguard": {} } },
            { "hostname": "de-fra-ovpn-001", "ipv4_addr_in": "10.2.0.2", "endpoint_data": "openvpn" },
            { "hostname": "de-fra-br-001", "ipv4_addr_in": "10.2.0.3", "endpoint_data": "bridge" }
          ]
        }
      ]
    }
  ]
}"#;

#[test]
fn test_scenario_a_protocol_filter() {
    let all = parse_directory(DIRECTORY, None).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all.iter().filter(|r| r.protocol == ProtocolType::WireGuard).count(), 3);

    let openvpn = parse_directory(DIRECTORY, Some(ProtocolType::OpenVpn)).unwrap();
    assert_eq!(openvpn.len(), 2);
    assert!(openvpn.iter().all(|r| r.protocol == ProtocolType::OpenVpn));

    let mut hostnames: Vec<&str> = openvpn.iter().map(|r| r.hostname.as_str()).collect();
    hostnames.sort();
    assert_eq!(hostnames, vec!["de-ber-ovpn-001", "de-fra-ovpn-001"]);
}

#[test]
fn test_scenario_b_distance_cutoff() {
    let document = r#"{"countries":[{"name":"Nowhere","cities":[
        {"name":"Near","latitude":0.0,"longitude":1.0,"relays":[{"hostname":"near","ipv4_addr_in":"10.0.0.1","type":"wireguard"}]},
        {"name":"Far","latitude":0.0,"longitude":10.0,"relays":[{"hostname":"far","ipv4_addr_in":"10.0.0.2","type":"wireguard"}]}
    ]}]}"#;

    let entries = parse_directory(document, None).unwrap();
    let ranked = rank(entries, origin(0.0, 0.0), 500.0);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].relay.hostname, "near");
    assert!((ranked[0].distance_km - 111.19).abs() < 0.5);
}

#[tokio::test]
async fn test_scenario_c_timeout_sorted_last() {
    let document = r#"{"countries":[{"name":"Nowhere","cities":[
        {"name":"A","latitude":0.0,"longitude":0.1,"relays":[{"hostname":"silent","ipv4_addr_in":"10.0.0.9","type":"openvpn"}]},
        {"name":"B","latitude":0.0,"longitude":0.2,"relays":[{"hostname":"answers","ipv4_addr_in":"10.0.0.8","type":"openvpn"}]}
    ]}]}"#;

    let pinger = TablePinger::new(&[("10.0.0.8", Ok(20))]);
    let prober = LatencyProber::new(pinger, settings(150));

    let ranked = rank(parse_directory(document, None).unwrap(), origin(0.0, 0.0), 500.0);
    assert_eq!(ranked[0].relay.hostname, "silent");

    let ordered = order(prober.probe(ranked).await);

    assert_eq!(ordered[0].relay().hostname, "answers");
    assert_eq!(ordered[0].probe, ProbeResult::Measured(Duration::from_millis(20)));
    assert_eq!(ordered[1].relay().hostname, "silent");
    assert_eq!(ordered[1].probe, ProbeResult::TimedOut);

    let rendered = table::render(&ordered);
    let rows: Vec<&str> = rendered.lines().skip(2).collect();
    assert!(rows[0].ends_with(" 20"));
    assert!(rows[1].ends_with(" timeout"));
}

#[tokio::test]
async fn test_scenario_d_empty_pipeline() {
    let entries = parse_directory(DIRECTORY, None).unwrap();
    let ranked = rank(entries, origin(0.0, 0.0), 0.0);
    assert!(ranked.is_empty());

    let prober = LatencyProber::new(TablePinger::new(&[]), settings(100));
    let probed = prober.probe(ranked).await;
    assert!(probed.is_empty());
    assert!(order(probed).is_empty());
}

#[tokio::test]
async fn test_integration_end_to_end_finder() {
    let pinger = TablePinger::new(&[
        ("10.1.0.1", Ok(35)),
        ("10.1.0.2", Err("no route to host")),
        ("10.1.0.3", Ok(12)),
        ("10.2.0.1", Ok(5)),
    ]);
    let finder = RelayFinder::new(pinger, settings(200));
    let entries = parse_directory(DIRECTORY, None).unwrap();

    // From Potsdam: Berlin is ~30 km away, Frankfurt ~430 km
    let result = finder.find(entries, origin(52.39, 13.06), 100.0).await;

    assert_eq!(result.total_candidates, 5);
    let hostnames: Vec<&str> = result.relays.iter().map(|r| r.relay().hostname.as_str()).collect();
    assert_eq!(hostnames, vec!["de-ber-ovpn-001", "de-ber-wg-001", "de-ber-wg-002"]);
    assert_eq!(result.relays[2].probe, ProbeResult::Unreachable);

    let rendered = table::render(&result.relays);
    assert!(rendered.lines().last().unwrap().ends_with("unresolvable"));
}

#[tokio::test]
async fn test_every_entry_survives_probing() {
    let entries = parse_directory(DIRECTORY, None).unwrap();
    let ranked = rank(entries, origin(51.0, 11.0), 1000.0);
    let count = ranked.len();
    assert_eq!(count, 5);

    // Nothing answers
    let prober = LatencyProber::new(TablePinger::new(&[]), settings(50));
    let probed = prober.probe(ranked.clone()).await;

    assert_eq!(probed.len(), count);
    for (out, original) in probed.iter().zip(&ranked) {
        assert_eq!(&out.ranked, original);
        assert_eq!(out.probe, ProbeResult::TimedOut);
    }
}
