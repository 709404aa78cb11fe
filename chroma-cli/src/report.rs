//! Human and JSON-lines rendering of readouts.

use chroma_core::{TunerReadout, TuningIndicator};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimedReadout<'a> {
    time_secs: f64,
    #[serde(flatten)]
    readout: &'a TunerReadout,
    note_name: Option<&'static str>,
}

/// `  1.250s  A4   +1.3 ct   440.57 Hz  in tune`
pub fn format_line(time_secs: f64, readout: &TunerReadout) -> String {
    if !readout.has_pitch() || readout.indicator == TuningIndicator::NoSignal {
        return format!("{time_secs:>8.3}s  --   no signal{}", mute_suffix(readout));
    }
    let note = format!("{}{}", readout.note_name(), readout.octave);
    let state = match readout.indicator {
        TuningIndicator::Flat => "flat",
        TuningIndicator::Sharp => "sharp",
        TuningIndicator::InTune => "in tune",
        TuningIndicator::NoSignal => "no signal",
    };
    format!(
        "{time_secs:>8.3}s  {note:<4} {cents:>+6.1} ct  {freq:>8.2} Hz  {state}{mute}",
        cents = readout.cent_deviation,
        freq = readout.frequency,
        mute = mute_suffix(readout),
    )
}

fn mute_suffix(readout: &TunerReadout) -> &'static str {
    if readout.muted {
        "  [muted]"
    } else {
        ""
    }
}

pub fn format_json(time_secs: f64, readout: &TunerReadout) -> serde_json::Result<String> {
    serde_json::to_string(&TimedReadout {
        time_secs,
        readout,
        note_name: readout.has_pitch().then(|| readout.note_name()),
    })
}

pub fn emit(time_secs: f64, readout: &TunerReadout, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", format_json(time_secs, readout)?);
    } else {
        println!("{}", format_line(time_secs, readout));
    }
    Ok(())
}
