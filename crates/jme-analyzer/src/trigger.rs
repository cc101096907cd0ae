//! HLT paths recorded per event.

use jme_core::TriggerResults;
use serde::Serialize;

/// Base names (without the `_v<N>` version suffix) of the recorded HLT paths.
pub const HLT_PATHS: [&str; 33] = [
    "HLT_Photon110EB_TightID_TightIso",
    "HLT_Photon165_R9Id90_HE10_IsoM",
    "HLT_Photon120_R9Id90_HE10_IsoM",
    "HLT_Photon90_R9Id90_HE10_IsoM",
    "HLT_Photon75_R9Id90_HE10_IsoM",
    "HLT_Photon50_R9Id90_HE10_IsoM",
    "HLT_Photon200",
    "HLT_Photon175",
    "HLT_PFMETNoMu120_PFMHTNoMu120_IDTight_PFHT60",
    "HLT_PFMETNoMu120_PFMHTNoMu120_IDTight",
    "HLT_PFMET120_PFMHT120_IDTight_PFHT60",
    "HLT_PFMET120_PFMHT120_IDTight",
    "HLT_PFHT1050",
    "HLT_PFHT900",
    "HLT_PFJet500",
    "HLT_AK8PFJet500",
    "HLT_Ele35_WPTight_Gsf",
    "HLT_Ele32_WPTight_Gsf",
    "HLT_Ele27_WPTight_Gsf",
    "HLT_IsoMu27",
    "HLT_IsoMu24",
    "HLT_IsoTkMu24",
    "HLT_TkMu17_TrkIsoVVL_TkMu8_TrkIsoVVL_DZ",
    "HLT_Mu17_TrkIsoVVL_TkMu8_TrkIsoVVL_DZ",
    "HLT_Mu17_TrkIsoVVL_Mu8_TrkIsoVVL",
    "HLT_Mu17_TrkIsoVVL_Mu8_TrkIsoVVL_DZ",
    "HLT_Mu17_TrkIsoVVL_Mu8_TrkIsoVVL_DZ_Mass3p8",
    "HLT_Ele23_Ele12_CaloIdL_TrackIdL_IsoVL",
    "HLT_Ele23_Ele12_CaloIdL_TrackIdL_IsoVL_DZ",
    "HLT_Mu23_TrkIsoVVL_Ele12_CaloIdL_TrackIdL_IsoVL_DZ",
    "HLT_Mu8_TrkIsoVVL_Ele23_CaloIdL_TrackIdL_IsoVL_DZ",
    "HLT_Mu23_TrkIsoVVL_Ele12_CaloIdL_TrackIdL_IsoVL",
    "HLT_Mu8_TrkIsoVVL_Ele23_CaloIdL_TrackIdL_IsoVL",
];

/// Accept bits for [`HLT_PATHS`], in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBits([bool; HLT_PATHS.len()]);

// std and serde only derive these for arrays up to 32 elements.
impl Default for TriggerBits {
    fn default() -> Self {
        TriggerBits([false; HLT_PATHS.len()])
    }
}

impl Serialize for TriggerBits {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeTuple;
        struct Bits<'a>(&'a [bool; HLT_PATHS.len()]);
        impl Serialize for Bits<'_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut tup = serializer.serialize_tuple(self.0.len())?;
                for b in self.0 {
                    tup.serialize_element(b)?;
                }
                tup.end()
            }
        }
        serializer.serialize_newtype_struct("TriggerBits", &Bits(&self.0))
    }
}

impl TriggerBits {
    /// A path fires when any accepted entry contains `<base>_v`.
    ///
    /// A missing HLT collection leaves every bit `false`.
    pub fn from_results(results: Option<&TriggerResults>) -> TriggerBits {
        let mut bits = TriggerBits::default();
        let Some(results) = results else {
            return bits;
        };
        for path in results.paths.iter().filter(|p| p.accept) {
            for (i, base) in HLT_PATHS.iter().enumerate() {
                if bits.0[i] {
                    continue;
                }
                // `_v` keeps e.g. HLT_PFHT900 from matching HLT_PFHT9000_v1.
                bits.0[i] = path.name.contains(&format!("{base}_v"));
            }
        }
        bits
    }

    /// Bit for the path with base name `base`; unknown names read as `false`.
    pub fn fired(&self, base: &str) -> bool {
        HLT_PATHS.iter().position(|p| *p == base).is_some_and(|i| self.0[i])
    }

    /// `(base name, bit)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        HLT_PATHS.iter().copied().zip(self.0.iter().copied())
    }
}
