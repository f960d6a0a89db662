/// Wrap raw 16-bit PCM into a WAV (RIFF) container.
///
/// The `sample_rate` written here MUST match the rate the synthesis
/// call was made with. A mismatch plays back garbled; the service
/// pins both to the same constant and tests the header directly.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate: u32 = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align: u16 = channels * (bits_per_sample / 8);
    let data_size: u32 = pcm.len() as u32;
    let riff_size: u32 = 36 + data_size;

    let mut out = Vec::<u8>::with_capacity(44 + pcm.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

/// Read the sample rate back out of a WAV header.
pub fn wav_sample_rate(wav: &[u8]) -> Option<u32> {
    if wav.len() < 44 || &wav[0..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
        return None;
    }
    Some(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]))
}
