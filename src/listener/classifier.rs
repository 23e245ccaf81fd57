use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;

use super::packet::Packet;

// Dynamic/private range boundaries, both exclusive.
const REGISTERED_PORT_LOW: u32 = 1024;
const REGISTERED_PORT_HIGH: u32 = 49151;

pub const UNKNOWN_APPLICATION: &str = "Unknown";

/// Well known service name for a port.
pub fn port_name(port: u32) -> Option<&'static str> {
    let name = match port {
        20 => "FTP-DATA",
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        67 | 68 => "DHCP",
        69 => "TFTP",
        80 => "HTTP",
        110 => "POP3",
        123 => "NTP",
        137 => "NetBIOS-NS",
        138 => "NetBIOS-DGM",
        139 => "NetBIOS-SSN",
        143 => "IMAP",
        161 => "SNMP",
        162 => "SNMP-TRAP",
        179 => "BGP",
        389 => "LDAP",
        443 => "HTTPS",
        465 => "SMTPS",
        514 => "Syslog",
        587 => "SMTP-Submission",
        636 => "LDAPS",
        993 => "IMAPS",
        995 => "POP3S",
        1080 => "SOCKS",
        1194 => "OpenVPN",
        1433 => "MSSQL",
        1521 => "Oracle DB",
        1723 => "PPTP",
        1812 => "RADIUS",
        2049 => "NFS",
        2082 => "cPanel",
        2083 => "cPanel-SSL",
        3306 => "MySQL",
        3389 => "RDP",
        3690 => "Subversion",
        4444 => "Metasploit",
        5000 => "UPnP",
        5432 => "PostgreSQL",
        5631 => "PCAnywhere",
        5900 => "VNC",
        6379 => "Redis",
        8080 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        8888 => "Alternate HTTP",
        9001 => "Tor ORPort",
        9200 => "Elasticsearch",
        10000 => "Webmin",
        27017 => "MongoDB",
        50000 => "SAP",
        64738 => "Mumble",
        _ => return None,
    };
    Some(name)
}

/// Application label for a packet. Source port wins over destination port,
/// then registered-range destination ports, then the protocol column.
pub fn classify(packet: &Packet) -> Cow<'_, str> {
    if let Some(name) = port_name(packet.src_port) {
        return Cow::Borrowed(name);
    }
    if let Some(name) = port_name(packet.dst_port) {
        return Cow::Borrowed(name);
    }
    if packet.dst_port > REGISTERED_PORT_LOW && packet.dst_port < REGISTERED_PORT_HIGH {
        return Cow::Owned(format!("App-Port-{}", packet.dst_port));
    }
    if !packet.protocol.is_empty() && packet.protocol != UNKNOWN_APPLICATION {
        return Cow::Borrowed(packet.protocol.as_str());
    }
    Cow::Borrowed(UNKNOWN_APPLICATION)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppTraffic {
    pub application: String,
    pub bytes: u64,
}

/// Applications ranked by summed frame length, largest first.
/// Equal volumes keep the order in which the application was first seen.
pub fn top_applications<'a, I>(packets: I, top_n: usize) -> Vec<AppTraffic>
where
    I: IntoIterator<Item = &'a Packet>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut apps: Vec<AppTraffic> = Vec::new();

    for packet in packets {
        let label = classify(packet);
        match index.get(&*label) {
            Some(&i) => {
                apps[i].bytes = apps[i].bytes.saturating_add(packet.frame_len);
            }
            None => {
                index.insert(label.to_string(), apps.len());
                apps.push(AppTraffic {
                    application: label.into_owned(),
                    bytes: packet.frame_len,
                });
            }
        }
    }

    // sort_by is stable
    apps.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    apps.truncate(top_n);
    apps
}
