//! ALSA capture device enumeration.
//!
//! Lists PCM names from the ALSA configuration (`default`, `sysdefault:…`,
//! plugin devices) and the sound cards the kernel knows about, the latter
//! as `plughw:N,0` so they can be opened with any supported format.

use alsa::card;
use alsa::device_name::HintIter;
use alsa::Direction;

use mic_capture_core::models::audio_models::AudioDevice;
use mic_capture_core::models::error::CaptureError;

/// PCM name ALSA routes to the user's default capture device.
pub const DEFAULT_DEVICE: &str = "default";

/// Capture device enumerator backed by ALSA hints and the card list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceEnumerator;

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self
    }

    /// PCM devices from the ALSA configuration that can capture.
    pub fn list_capture_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        let hints = HintIter::new_str(None, "pcm")
            .map_err(|e| CaptureError::Enumeration(format!("PCM hints unavailable: {}", e)))?;

        let devices: Vec<AudioDevice> = hints
            .filter(|hint| can_capture(hint.direction))
            .filter_map(|hint| {
                let id = hint.name?;
                if id == "null" {
                    return None;
                }
                Some(hint_device(id, hint.desc))
            })
            .collect();

        log::debug!("Found {} ALSA capture PCMs", devices.len());
        Ok(devices)
    }

    /// One entry per sound card, addressed as its first device.
    pub fn list_cards(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        let mut devices = Vec::new();
        for card in card::Iter::new() {
            let card = match card {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Skipping unreadable sound card: {}", e);
                    continue;
                }
            };
            let index = card.get_index();
            let name = card.get_name().unwrap_or_else(|_| format!("Card {}", index));

            devices.push(AudioDevice {
                id: card_device_id(index),
                name,
                description: card.get_longname().ok(),
                is_default: false,
            });
        }
        Ok(devices)
    }

    /// The device ALSA uses when no specific one is requested.
    pub fn default_capture_device(&self) -> AudioDevice {
        AudioDevice {
            id: DEFAULT_DEVICE.to_string(),
            name: "Default capture device".into(),
            description: None,
            is_default: true,
        }
    }
}

/// Hints without a direction are usable both ways.
fn can_capture(direction: Option<Direction>) -> bool {
    !matches!(direction, Some(Direction::Playback))
}

fn card_device_id(index: i32) -> String {
    format!("plughw:{},0", index)
}

/// ALSA descriptions are multi-line; the first line is the display name.
fn hint_device(id: String, desc: Option<String>) -> AudioDevice {
    let name = desc
        .as_deref()
        .and_then(|d| d.lines().next())
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    let description = desc.map(|d| d.lines().collect::<Vec<_>>().join(" "));
    let is_default = id == DEFAULT_DEVICE;

    AudioDevice {
        id,
        name,
        description,
        is_default,
    }
}
