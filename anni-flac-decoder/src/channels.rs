use crate::frames::ChannelAssignment;

/// Undoes inter-channel decorrelation in place.
///
/// `samples` holds every channel of one block, channel-major, `block_size` samples each.
/// Stereo assignments only touch the first two channels.
pub fn decorrelate(assignment: ChannelAssignment, samples: &mut [i64], block_size: usize) {
    match assignment {
        ChannelAssignment::Independent(_) => {}
        ChannelAssignment::LeftSide => {
            let (left, side) = stereo(samples, block_size);
            for (left, side) in left.iter().zip(side.iter_mut()) {
                *side = left.wrapping_sub(*side);
            }
        }
        ChannelAssignment::RightSide => {
            let (side, right) = stereo(samples, block_size);
            for (side, right) in side.iter_mut().zip(right.iter()) {
                *side = side.wrapping_add(*right);
            }
        }
        ChannelAssignment::MidSide => {
            let (mid, side) = stereo(samples, block_size);
            for (mid, side) in mid.iter_mut().zip(side.iter_mut()) {
                // the encoder dropped the lowest bit of mid, it equals the lowest bit of side
                let sum = (*mid << 1) | (*side & 1);
                let left = sum.wrapping_add(*side) >> 1;
                let right = sum.wrapping_sub(*side) >> 1;
                *mid = left;
                *side = right;
            }
        }
    }
}

fn stereo(samples: &mut [i64], block_size: usize) -> (&mut [i64], &mut [i64]) {
    let (first, rest) = samples.split_at_mut(block_size);
    (first, &mut rest[..block_size])
}
