//! Per-channel reference tables used for thru note-tracking (C4).
//!
//! Ported from `mpu_t.chanref`/`mpu_t.inputref`/`mpu_t.ch_toref` and the
//! `M_GETKEY`/`M_SETKEY`/`M_DELKEY` bit-twiddling macros in
//! `snd_mpu401.c`, re-expressed as bitset methods.

/// A 128-bit "is this MIDI key currently pressed" bitmap, one bit per
/// key number `0..128`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyBitmap([u32; 4]);

impl KeyBitmap {
    pub fn get(&self, key: u8) -> bool {
        let key = key & 0x7f;
        self.0[(key >> 5) as usize] & (1 << (key & 0x1f)) != 0
    }

    pub fn set(&mut self, key: u8) {
        let key = key & 0x7f;
        self.0[(key >> 5) as usize] |= 1 << (key & 0x1f);
    }

    pub fn clear_key(&mut self, key: u8) {
        let key = key & 0x7f;
        self.0[(key >> 5) as usize] &= !(1 << (key & 0x1f));
    }

    pub fn clear_all(&mut self) {
        self.0 = [0; 4];
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Iterate every key number currently set.
    pub fn iter_set(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..128).filter(move |&k| self.get(k))
    }
}

/// One of the four addressable per-channel reference slots
/// (`spec.md` §3 "ChannelRef"). A fifth, always-disabled dummy slot at
/// index [`ChannelRef::DUMMY_SLOT`] is the fallback target for
/// channels not claimed by any of the four.
#[derive(Debug, Clone, Default)]
pub struct ChannelRef {
    pub on: bool,
    pub chan: u8,
    pub trmask: u16,
    pub key: KeyBitmap,
}

impl ChannelRef {
    pub const SLOT_COUNT: usize = 4;
    pub const DUMMY_SLOT: usize = 4;
    /// Backing array length: the four addressable slots plus the
    /// always-disabled dummy slot at [`ChannelRef::DUMMY_SLOT`].
    pub const TOTAL_SLOTS: usize = Self::SLOT_COUNT + 1;

    pub fn reset(&mut self) {
        self.on = false;
        self.chan = 0;
        self.trmask = 0;
        self.key.clear_all();
    }
}

/// One of the sixteen per-MIDI-channel input reference slots
/// (`spec.md` §3 "InputRef"), the same `{on, chan, trmask, key[4]}`
/// shape as [`ChannelRef`].
#[derive(Debug, Clone, Default)]
pub struct InputRef {
    pub on: bool,
    pub chan: u8,
    pub trmask: u16,
    pub key: KeyBitmap,
}

impl InputRef {
    pub fn reset(&mut self) {
        self.on = false;
        self.chan = 0;
        self.trmask = 0;
        self.key.clear_all();
    }
}

/// The full reference-table bank: four [`ChannelRef`] slots (plus the
/// inert dummy slot), sixteen [`InputRef`] slots, and the
/// channel-to-slot map.
#[derive(Debug, Clone)]
pub struct ReferenceBank {
    pub chanref: [ChannelRef; ChannelRef::TOTAL_SLOTS],
    pub inputref: [InputRef; 16],
    /// `ch_toref[c]` is the `chanref` slot index (`0..=4`) owning
    /// channel `c`'s key bitmap; `4` means "unclaimed, dummy slot".
    pub ch_toref: [usize; 16],
}

impl ReferenceBank {
    pub fn reset(&mut self) {
        for c in &mut self.chanref {
            c.reset();
        }
        for i in &mut self.inputref {
            i.reset();
        }
        self.ch_toref = [ChannelRef::DUMMY_SLOT; 16];
    }

    /// Opcode `0x40..=0x7F`: claim `channel` for `slot` (`0..=3`),
    /// clearing its key bitmap and re-pointing `ch_toref`. Any other
    /// channel previously pointing at `slot` falls back to the dummy
    /// slot.
    pub fn set_reference_channel(&mut self, slot: usize, channel: u8) {
        debug_assert!(slot < ChannelRef::SLOT_COUNT);
        let channel = (channel & 0x0f) as usize;
        for c in self.ch_toref.iter_mut() {
            if *c == slot {
                *c = ChannelRef::DUMMY_SLOT;
            }
        }
        self.chanref[slot].chan = channel as u8;
        self.chanref[slot].key.clear_all();
        self.ch_toref[channel] = slot;
    }

    /// Opcode `0x98..=0x9F`: enable/disable `chanref[slot]`.
    pub fn set_chanref_enabled(&mut self, slot: usize, on: bool) {
        debug_assert!(slot < ChannelRef::SLOT_COUNT);
        self.chanref[slot].on = on;
    }

    /// Mirror of the `midi_thru` opcode (`0x88`/`0x89`): every
    /// `InputRef.on` follows the new flag value; key bitmaps are only
    /// cleared when thru is being turned off.
    pub fn mirror_midi_thru(&mut self, on: bool) {
        for i in &mut self.inputref {
            i.on = on;
            if !on {
                i.key.clear_all();
            }
        }
    }

    /// The `chanref` slot backing `channel`'s key bitmap, following
    /// `ch_toref`. Returns the dummy slot for unclaimed channels.
    pub fn slot_for_channel(&self, channel: u8) -> usize {
        self.ch_toref[(channel & 0x0f) as usize]
    }
}

impl Default for ReferenceBank {
    fn default() -> Self {
        let mut bank = ReferenceBank {
            chanref: Default::default(),
            inputref: Default::default(),
            ch_toref: [ChannelRef::DUMMY_SLOT; 16],
        };
        bank.reset();
        bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bitmap_set_get_clear() {
        let mut k = KeyBitmap::default();
        assert!(!k.get(60));
        k.set(60);
        assert!(k.get(60));
        k.clear_key(60);
        assert!(!k.get(60));
    }

    #[test]
    fn key_bitmap_high_key_uses_fourth_word() {
        let mut k = KeyBitmap::default();
        k.set(127);
        assert!(k.get(127));
        assert!(!k.get(126));
    }

    #[test]
    fn unclaimed_channel_defaults_to_dummy_slot() {
        let bank = ReferenceBank::default();
        assert_eq!(bank.slot_for_channel(3), ChannelRef::DUMMY_SLOT);
    }

    #[test]
    fn claiming_a_channel_evicts_the_previous_claimant() {
        let mut bank = ReferenceBank::default();
        bank.set_reference_channel(0, 5);
        assert_eq!(bank.slot_for_channel(5), 0);
        bank.set_reference_channel(0, 6);
        assert_eq!(bank.slot_for_channel(6), 0);
        assert_eq!(bank.slot_for_channel(5), ChannelRef::DUMMY_SLOT);
    }

    #[test]
    fn claiming_a_channel_clears_the_slots_key_bitmap() {
        let mut bank = ReferenceBank::default();
        bank.set_reference_channel(0, 5);
        bank.chanref[0].key.set(64);
        bank.set_reference_channel(0, 5);
        assert!(!bank.chanref[0].key.get(64));
    }
}
