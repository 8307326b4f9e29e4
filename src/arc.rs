//! Arcs, 45-degree arc sectors, and rounded boxes.
//!
//! Sectors divide the circle into eight 45-degree octants, one bit each,
//! starting with bit 0 just above the positive x axis and proceeding
//! counterclockwise through the top half, then continuing through the
//! bottom half back to the x axis. Whole octants render with pure integer
//! Bresenham walks; arbitrary start/end angles pre-render the fully covered
//! octants the same way and then walk the two partial octants against the
//! edge coordinate of the bounding angle.

use crate::basics::{
    cos_deg, float_to_fixed, from_fixed, iround, sin_deg, to_fixed, Coord, Fixed, Rect, FIXED0_5,
};
use crate::color::Color;
use crate::surface::{Display, Surface};

impl Surface {
    // ------------------------------------------------------------------------
    // Whole sectors
    // ------------------------------------------------------------------------

    /// Draw the outline arc of the given sectors.
    pub(crate) fn draw_arc_sectors(
        &mut self,
        x: Coord,
        y: Coord,
        radius: Coord,
        sectors: u8,
        color: Color,
    ) {
        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;

        // Boundary pixels are shared between adjacent sectors, so they are
        // gated on either neighbor being present.
        if sectors & 0x06 != 0 {
            self.draw_pixel_clipped(x, y - b, color);
        }
        if sectors & 0x60 != 0 {
            self.draw_pixel_clipped(x, y + b, color);
        }
        if sectors & 0x81 != 0 {
            self.draw_pixel_clipped(x + b, y, color);
        }
        if sectors & 0x18 != 0 {
            self.draw_pixel_clipped(x - b, y, color);
        }

        loop {
            if sectors & 0x01 != 0 {
                self.draw_pixel_clipped(x + b, y - a, color);
            }
            if sectors & 0x02 != 0 {
                self.draw_pixel_clipped(x + a, y - b, color);
            }
            if sectors & 0x04 != 0 {
                self.draw_pixel_clipped(x - a, y - b, color);
            }
            if sectors & 0x08 != 0 {
                self.draw_pixel_clipped(x - b, y - a, color);
            }
            if sectors & 0x10 != 0 {
                self.draw_pixel_clipped(x - b, y + a, color);
            }
            if sectors & 0x20 != 0 {
                self.draw_pixel_clipped(x - a, y + b, color);
            }
            if sectors & 0x40 != 0 {
                self.draw_pixel_clipped(x + a, y + b, color);
            }
            if sectors & 0x80 != 0 {
                self.draw_pixel_clipped(x + b, y + a, color);
            }
            if p < 0 {
                p += 3 + 2 * a;
                a += 1;
            } else {
                p += 5 + 2 * (a - b);
                a += 1;
                b -= 1;
            }
            if a >= b {
                break;
            }
        }

        if sectors & 0xC0 != 0 {
            self.draw_pixel_clipped(x + a, y + b, color);
        }
        if sectors & 0x03 != 0 {
            self.draw_pixel_clipped(x + a, y - b, color);
        }
        if sectors & 0x30 != 0 {
            self.draw_pixel_clipped(x - a, y + b, color);
        }
        if sectors & 0x0C != 0 {
            self.draw_pixel_clipped(x - a, y - b, color);
        }
    }

    /// Fill the pie slices of the given sectors.
    pub(crate) fn fill_arc_sectors(
        &mut self,
        x: Coord,
        y: Coord,
        radius: Coord,
        sectors: u8,
        color: Color,
    ) {
        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;

        if sectors & 0x06 != 0 {
            self.draw_pixel_clipped(x, y - b, color);
        }
        if sectors & 0x60 != 0 {
            self.draw_pixel_clipped(x, y + b, color);
        }
        if sectors & 0x81 != 0 {
            let x0 = if sectors & 0x18 != 0 { x - b } else { x };
            self.hline(x0, x + b, y, color);
        } else if sectors & 0x18 != 0 {
            self.hline(x - b, x, y, color);
        }

        loop {
            // Top half: the four upper sectors combine into one of sixteen
            // run patterns per step.
            match sectors & 0x0F {
                0x01 => {
                    self.hline(x + a, x + b, y - a, color);
                }
                0x02 => {
                    self.hline(x, x + a, y - b, color);
                    self.hline(x, x + a, y - a, color);
                }
                0x03 => {
                    self.hline(x, x + a, y - b, color);
                    self.hline(x, x + b, y - a, color);
                }
                0x04 => {
                    self.hline(x - a, x, y - b, color);
                    self.hline(x - a, x, y - a, color);
                }
                0x05 => {
                    self.hline(x - a, x, y - b, color);
                    self.hline(x - a, x, y - a, color);
                    self.hline(x + a, x + b, y - a, color);
                }
                0x06 => {
                    self.hline(x - a, x + a, y - b, color);
                    self.hline(x - a, x + a, y - a, color);
                }
                0x07 => {
                    self.hline(x - a, x + a, y - b, color);
                    self.hline(x - a, x + b, y - a, color);
                }
                0x08 => {
                    self.hline(x - b, x - a, y - a, color);
                }
                0x09 => {
                    self.hline(x - b, x - a, y - a, color);
                    self.hline(x + a, x + b, y - a, color);
                }
                0x0A => {
                    self.hline(x, x + a, y - b, color);
                    self.hline(x - b, x - a, y - a, color);
                    self.hline(x, x + a, y - a, color);
                }
                0x0B => {
                    self.hline(x, x + a, y - b, color);
                    self.hline(x - b, x - a, y - a, color);
                    self.hline(x, x + b, y - a, color);
                }
                0x0C => {
                    self.hline(x - a, x, y - b, color);
                    self.hline(x - b, x, y - a, color);
                }
                0x0D => {
                    self.hline(x - a, x, y - b, color);
                    self.hline(x - b, x, y - a, color);
                    self.hline(x + a, x + b, y - a, color);
                }
                0x0E => {
                    self.hline(x - a, x + a, y - b, color);
                    self.hline(x - b, x + a, y - a, color);
                }
                0x0F => {
                    self.hline(x - a, x + a, y - b, color);
                    self.hline(x - b, x + b, y - a, color);
                }
                _ => {}
            }

            // Bottom half, mirrored.
            match (sectors & 0xF0) >> 4 {
                0x01 => {
                    self.hline(x - b, x - a, y + a, color);
                }
                0x02 => {
                    self.hline(x - a, x, y + b, color);
                    self.hline(x - a, x, y + a, color);
                }
                0x03 => {
                    self.hline(x - a, x, y + b, color);
                    self.hline(x - b, x, y + a, color);
                }
                0x04 => {
                    self.hline(x, x + a, y + b, color);
                    self.hline(x, x + a, y + a, color);
                }
                0x05 => {
                    self.hline(x, x + a, y + b, color);
                    self.hline(x - b, x - a, y + a, color);
                    self.hline(x, x + a, y + a, color);
                }
                0x06 => {
                    self.hline(x - a, x + a, y + b, color);
                    self.hline(x - a, x + a, y + a, color);
                }
                0x07 => {
                    self.hline(x - a, x + a, y + b, color);
                    self.hline(x - b, x + a, y + a, color);
                }
                0x08 => {
                    self.hline(x + a, x + b, y + a, color);
                }
                0x09 => {
                    self.hline(x - b, x - a, y + a, color);
                    self.hline(x + a, x + b, y + a, color);
                }
                0x0A => {
                    self.hline(x - a, x, y + b, color);
                    self.hline(x - a, x, y + a, color);
                    self.hline(x + a, x + b, y + a, color);
                }
                0x0B => {
                    self.hline(x - a, x, y + b, color);
                    self.hline(x - b, x, y + a, color);
                    self.hline(x + a, x + b, y + a, color);
                }
                0x0C => {
                    self.hline(x, x + a, y + b, color);
                    self.hline(x, x + b, y + a, color);
                }
                0x0D => {
                    self.hline(x, x + a, y + b, color);
                    self.hline(x - b, x - a, y + a, color);
                    self.hline(x, x + b, y + a, color);
                }
                0x0E => {
                    self.hline(x - a, x + a, y + b, color);
                    self.hline(x - a, x + b, y + a, color);
                }
                0x0F => {
                    self.hline(x - a, x + a, y + b, color);
                    self.hline(x - b, x + b, y + a, color);
                }
                _ => {}
            }

            if p < 0 {
                p += 3 + 2 * a;
                a += 1;
            } else {
                p += 5 + 2 * (a - b);
                a += 1;
                b -= 1;
            }
            if a >= b {
                break;
            }
        }

        // Close off the diagonal edges.
        if sectors & 0x02 != 0 {
            self.hline(x, x + a, y - a, color);
        } else if sectors & 0x01 != 0 {
            self.draw_pixel_clipped(x + a, y - a, color);
        }
        if sectors & 0x04 != 0 {
            self.hline(x - a, x, y - a, color);
        } else if sectors & 0x08 != 0 {
            self.draw_pixel_clipped(x - a, y - a, color);
        }
        if sectors & 0x40 != 0 {
            self.hline(x, x + a, y + a, color);
        } else if sectors & 0x80 != 0 {
            self.draw_pixel_clipped(x + a, y + a, color);
        }
        if sectors & 0x20 != 0 {
            self.hline(x - a, x, y + a, color);
        } else if sectors & 0x10 != 0 {
            self.draw_pixel_clipped(x - a, y + a, color);
        }
    }

    // ------------------------------------------------------------------------
    // Arbitrary angles
    // ------------------------------------------------------------------------

    /// Draw an arc outline counterclockwise from `start` to `end` degrees.
    /// Angles are measured from the positive x axis; equal angles draw the
    /// full circle.
    pub(crate) fn draw_arc(
        &mut self,
        x: Coord,
        y: Coord,
        radius: Coord,
        start: Coord,
        end: Coord,
        color: Color,
    ) {
        let start = normalize_angle(start);
        let end = normalize_angle(end);

        let sbit: u8 = 1 << (start / 45);
        let ebit: u8 = 1 << (end / 45);

        // Octants entirely inside the span render without edge tests.
        let mut full: u8 = 0;
        if start == end {
            full = 0xFF;
        } else if end < start {
            let mut t = (sbit as u16) << 1;
            while t & 0xFF != 0 {
                full |= t as u8;
                t <<= 1;
            }
            let mut t = ebit >> 1;
            while t != 0 {
                full |= t;
                t >>= 1;
            }
        } else if sbit < 0x80 {
            let mut t = sbit << 1;
            while t < ebit {
                full |= t;
                t <<= 1;
            }
        }
        let tbit = if start % 45 == 0 { sbit } else { 0 };

        if full != 0 {
            let mut a: Coord = 1;
            let mut b = radius;
            let mut p = 4 - radius;
            if full & 0x60 != 0 {
                self.draw_pixel_clipped(x, y + b, color);
            }
            if full & 0x06 != 0 {
                self.draw_pixel_clipped(x, y - b, color);
            }
            if full & 0x81 != 0 {
                self.draw_pixel_clipped(x + b, y, color);
            }
            if full & 0x18 != 0 {
                self.draw_pixel_clipped(x - b, y, color);
            }
            loop {
                if full & 0x01 != 0 {
                    self.draw_pixel_clipped(x + b, y - a, color);
                }
                if full & 0x02 != 0 {
                    self.draw_pixel_clipped(x + a, y - b, color);
                }
                if full & 0x04 != 0 {
                    self.draw_pixel_clipped(x - a, y - b, color);
                }
                if full & 0x08 != 0 {
                    self.draw_pixel_clipped(x - b, y - a, color);
                }
                if full & 0x10 != 0 {
                    self.draw_pixel_clipped(x - b, y + a, color);
                }
                if full & 0x20 != 0 {
                    self.draw_pixel_clipped(x - a, y + b, color);
                }
                if full & 0x40 != 0 {
                    self.draw_pixel_clipped(x + a, y + b, color);
                }
                if full & 0x80 != 0 {
                    self.draw_pixel_clipped(x + b, y + a, color);
                }
                if p < 0 {
                    p += 3 + 2 * a;
                    a += 1;
                } else {
                    p += 5 + 2 * (a - b);
                    a += 1;
                    b -= 1;
                }
                if a >= b {
                    break;
                }
            }
            if full & 0xC0 != 0 {
                self.draw_pixel_clipped(x + a, y + b, color);
            }
            if full & 0x0C != 0 {
                self.draw_pixel_clipped(x - a, y - b, color);
            }
            if full & 0x03 != 0 {
                self.draw_pixel_clipped(x + a, y - b, color);
            }
            if full & 0x30 != 0 {
                self.draw_pixel_clipped(x - a, y + b, color);
            }
            if full == 0xFF {
                return;
            }
        }

        // Edge coordinate of each bounding angle inside its octant. Octants
        // touching the y axis compare against the sine, the others against
        // the cosine.
        let mut sedge = iround(radius as f64 * if sbit & 0x99 != 0 {
            sin_deg(start)
        } else {
            cos_deg(start)
        });
        let mut eedge = iround(radius as f64 * if ebit & 0x99 != 0 {
            sin_deg(end)
        } else {
            cos_deg(end)
        });
        if sbit & 0xB4 != 0 {
            sedge = -sedge;
        }
        if ebit & 0xB4 != 0 {
            eedge = -eedge;
        }

        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;

        if sbit != ebit {
            // Start and end lie in different octants; walk both partials.
            if (sbit & 0x20) | (tbit & 0x40) | (ebit & 0x40) != 0 {
                self.draw_pixel_clipped(x, y + b, color);
            }
            if (sbit & 0x02) | (tbit & 0x04) | (ebit & 0x04) != 0 {
                self.draw_pixel_clipped(x, y - b, color);
            }
            if (sbit & 0x80) | (tbit & 0x01) | (ebit & 0x01) != 0 {
                self.draw_pixel_clipped(x + b, y, color);
            }
            if (sbit & 0x08) | (tbit & 0x10) | (ebit & 0x10) != 0 {
                self.draw_pixel_clipped(x - b, y, color);
            }
            loop {
                if (sbit & 0x01 != 0 && a >= sedge) || (ebit & 0x01 != 0 && a <= eedge) {
                    self.draw_pixel_clipped(x + b, y - a, color);
                }
                if (sbit & 0x02 != 0 && a <= sedge) || (ebit & 0x02 != 0 && a >= eedge) {
                    self.draw_pixel_clipped(x + a, y - b, color);
                }
                if (sbit & 0x04 != 0 && a >= sedge) || (ebit & 0x04 != 0 && a <= eedge) {
                    self.draw_pixel_clipped(x - a, y - b, color);
                }
                if (sbit & 0x08 != 0 && a <= sedge) || (ebit & 0x08 != 0 && a >= eedge) {
                    self.draw_pixel_clipped(x - b, y - a, color);
                }
                if (sbit & 0x10 != 0 && a >= sedge) || (ebit & 0x10 != 0 && a <= eedge) {
                    self.draw_pixel_clipped(x - b, y + a, color);
                }
                if (sbit & 0x20 != 0 && a <= sedge) || (ebit & 0x20 != 0 && a >= eedge) {
                    self.draw_pixel_clipped(x - a, y + b, color);
                }
                if (sbit & 0x40 != 0 && a >= sedge) || (ebit & 0x40 != 0 && a <= eedge) {
                    self.draw_pixel_clipped(x + a, y + b, color);
                }
                if (sbit & 0x80 != 0 && a <= sedge) || (ebit & 0x80 != 0 && a >= eedge) {
                    self.draw_pixel_clipped(x + b, y + a, color);
                }
                if p < 0 {
                    p += 3 + 2 * a;
                    a += 1;
                } else {
                    p += 5 + 2 * (a - b);
                    a += 1;
                    b -= 1;
                }
                if a >= b {
                    break;
                }
            }
            if (sbit & 0x40 != 0 && a >= sedge)
                || (ebit & 0x40 != 0 && a <= eedge)
                || (sbit & 0x80 != 0 && a <= sedge)
                || (ebit & 0x80 != 0 && a >= eedge)
            {
                self.draw_pixel_clipped(x + a, y + b, color);
            }
            if (sbit & 0x04 != 0 && a >= sedge)
                || (ebit & 0x04 != 0 && a <= eedge)
                || (sbit & 0x08 != 0 && a <= sedge)
                || (ebit & 0x08 != 0 && a >= eedge)
            {
                self.draw_pixel_clipped(x - a, y - b, color);
            }
            if (sbit & 0x01 != 0 && a >= sedge)
                || (ebit & 0x01 != 0 && a <= eedge)
                || (sbit & 0x02 != 0 && a <= sedge)
                || (ebit & 0x02 != 0 && a >= eedge)
            {
                self.draw_pixel_clipped(x + a, y - b, color);
            }
            if (sbit & 0x10 != 0 && a >= sedge)
                || (ebit & 0x10 != 0 && a <= eedge)
                || (sbit & 0x20 != 0 && a <= sedge)
                || (ebit & 0x20 != 0 && a >= eedge)
            {
                self.draw_pixel_clipped(x - a, y + b, color);
            }
        } else if end < start {
            // Same octant, wrapped the long way round; both partial spans
            // share the octant, everything between them is drawn.
            if (sbit & 0x60) | (tbit & 0xC0) != 0 {
                self.draw_pixel_clipped(x, y + b, color);
            }
            if (sbit & 0x06) | (tbit & 0x0C) != 0 {
                self.draw_pixel_clipped(x, y - b, color);
            }
            if (sbit & 0x81) | (tbit & 0x03) != 0 {
                self.draw_pixel_clipped(x + b, y, color);
            }
            if (sbit & 0x18) | (tbit & 0x30) != 0 {
                self.draw_pixel_clipped(x - b, y, color);
            }
            loop {
                if sbit & 0x01 != 0 && (a >= sedge || a <= eedge) {
                    self.draw_pixel_clipped(x + b, y - a, color);
                }
                if sbit & 0x02 != 0 && (a <= sedge || a >= eedge) {
                    self.draw_pixel_clipped(x + a, y - b, color);
                }
                if sbit & 0x04 != 0 && (a >= sedge || a <= eedge) {
                    self.draw_pixel_clipped(x - a, y - b, color);
                }
                if sbit & 0x08 != 0 && (a <= sedge || a >= eedge) {
                    self.draw_pixel_clipped(x - b, y - a, color);
                }
                if sbit & 0x10 != 0 && (a >= sedge || a <= eedge) {
                    self.draw_pixel_clipped(x - b, y + a, color);
                }
                if sbit & 0x20 != 0 && (a <= sedge || a >= eedge) {
                    self.draw_pixel_clipped(x - a, y + b, color);
                }
                if sbit & 0x40 != 0 && (a >= sedge || a <= eedge) {
                    self.draw_pixel_clipped(x + a, y + b, color);
                }
                if sbit & 0x80 != 0 && (a <= sedge || a >= eedge) {
                    self.draw_pixel_clipped(x + b, y + a, color);
                }
                if p < 0 {
                    p += 3 + 2 * a;
                    a += 1;
                } else {
                    p += 5 + 2 * (a - b);
                    a += 1;
                    b -= 1;
                }
                if a >= b {
                    break;
                }
            }
            if (sbit & 0x04 != 0 && (a >= sedge || a <= eedge))
                || (sbit & 0x08 != 0 && (a <= sedge || a >= eedge))
            {
                self.draw_pixel_clipped(x - a, y - b, color);
            }
            if (sbit & 0x40 != 0 && (a >= sedge || a <= eedge))
                || (sbit & 0x80 != 0 && (a <= sedge || a >= eedge))
            {
                self.draw_pixel_clipped(x + a, y + b, color);
            }
            if (sbit & 0x01 != 0 && (a >= sedge || a <= eedge))
                || (sbit & 0x02 != 0 && (a <= sedge || a >= eedge))
            {
                self.draw_pixel_clipped(x + a, y - b, color);
            }
            if (sbit & 0x10 != 0 && (a >= sedge || a <= eedge))
                || (sbit & 0x20 != 0 && (a <= sedge || a >= eedge))
            {
                self.draw_pixel_clipped(x - a, y + b, color);
            }
        } else {
            // Internal angle: both bounds in one octant, only the span
            // between them is drawn.
            if (sbit & 0x20 != 0 && eedge == 0) || (sbit & 0x40 != 0 && sedge == 0) {
                self.draw_pixel_clipped(x, y + b, color);
            }
            if (sbit & 0x02 != 0 && eedge == 0) || (sbit & 0x04 != 0 && sedge == 0) {
                self.draw_pixel_clipped(x, y - b, color);
            }
            if (sbit & 0x80 != 0 && eedge == 0) || (sbit & 0x01 != 0 && sedge == 0) {
                self.draw_pixel_clipped(x + b, y, color);
            }
            if (sbit & 0x08 != 0 && eedge == 0) || (sbit & 0x10 != 0 && sedge == 0) {
                self.draw_pixel_clipped(x - b, y, color);
            }
            loop {
                if sbit & 0x01 != 0 && a >= sedge && a <= eedge {
                    self.draw_pixel_clipped(x + b, y - a, color);
                }
                if sbit & 0x02 != 0 && a <= sedge && a >= eedge {
                    self.draw_pixel_clipped(x + a, y - b, color);
                }
                if sbit & 0x04 != 0 && a >= sedge && a <= eedge {
                    self.draw_pixel_clipped(x - a, y - b, color);
                }
                if sbit & 0x08 != 0 && a <= sedge && a >= eedge {
                    self.draw_pixel_clipped(x - b, y - a, color);
                }
                if sbit & 0x10 != 0 && a >= sedge && a <= eedge {
                    self.draw_pixel_clipped(x - b, y + a, color);
                }
                if sbit & 0x20 != 0 && a <= sedge && a >= eedge {
                    self.draw_pixel_clipped(x - a, y + b, color);
                }
                if sbit & 0x40 != 0 && a >= sedge && a <= eedge {
                    self.draw_pixel_clipped(x + a, y + b, color);
                }
                if sbit & 0x80 != 0 && a <= sedge && a >= eedge {
                    self.draw_pixel_clipped(x + b, y + a, color);
                }
                if p < 0 {
                    p += 3 + 2 * a;
                    a += 1;
                } else {
                    p += 5 + 2 * (a - b);
                    a += 1;
                    b -= 1;
                }
                if a >= b {
                    break;
                }
            }
            if (sbit & 0x04 != 0 && a >= sedge && a <= eedge)
                || (sbit & 0x08 != 0 && a <= sedge && a >= eedge)
            {
                self.draw_pixel_clipped(x - a, y - b, color);
            }
            if (sbit & 0x40 != 0 && a >= sedge && a <= eedge)
                || (sbit & 0x80 != 0 && a <= sedge && a >= eedge)
            {
                self.draw_pixel_clipped(x + a, y + b, color);
            }
            if (sbit & 0x01 != 0 && a >= sedge && a <= eedge)
                || (sbit & 0x02 != 0 && a <= sedge && a >= eedge)
            {
                self.draw_pixel_clipped(x + a, y - b, color);
            }
            if (sbit & 0x10 != 0 && a >= sedge && a <= eedge)
                || (sbit & 0x20 != 0 && a <= sedge && a >= eedge)
            {
                self.draw_pixel_clipped(x - a, y + b, color);
            }
        }
    }

    /// Fill the pie slice swept counterclockwise from `start` to `end`
    /// degrees.
    pub(crate) fn fill_arc(
        &mut self,
        x: Coord,
        y: Coord,
        radius: Coord,
        start: Coord,
        end: Coord,
        color: Color,
    ) {
        // The start and end lines through the center, as x-intercept plus
        // per-row slope in 16.16 fixed point. Screen y grows downward, so
        // the sines are negated.
        let mut sxa: Fixed = to_fixed(x) + FIXED0_5;
        let mut exa: Fixed = sxa;
        let mut sxb: Fixed = float_to_fixed(radius as f64 * cos_deg(start));
        let sy: Coord = -iround(radius as f64 * sin_deg(start));
        let mut exb: Fixed = float_to_fixed(radius as f64 * cos_deg(end));
        let ey: Coord = -iround(radius as f64 * sin_deg(end));
        let sxd: Fixed = if sy != 0 { sxb / sy } else { sxb };
        let exd: Fixed = if ey != 0 { exb / ey } else { exb };

        // Quadrant classification of both lines plus their vertical order.
        let mut qtr: u8 = 0;
        if sxb > 0 {
            qtr |= 0x01;
        }
        if sy > 0 {
            qtr |= 0x02;
        }
        if exb > 0 {
            qtr |= 0x04;
        }
        if ey > 0 {
            qtr |= 0x08;
        }
        if sy > ey {
            qtr |= 0x10;
        }

        let mut a: Coord = 1;
        let mut b = radius;
        let mut p = 4 - radius;
        sxb += sxa;
        exb += exa;

        macro_rules! step {
            () => {
                if p < 0 {
                    p += 3 + 2 * a;
                    a += 1;
                    false
                } else {
                    true
                }
            };
        }
        macro_rules! step_done {
            () => {
                p += 5 + 2 * (a - b);
                a += 1;
                b -= 1;
            };
        }

        match qtr {
            0 | 1 => {
                // Start in quarter 1 or 2, end in quarter 2, start below end.
                if ey != 0 && sy != 0 {
                    self.hline(x, x, y, color);
                    sxa -= sxd;
                    exa -= exd;
                } else if sy != 0 {
                    self.hline(x - b, x, y, color);
                    sxa -= sxd;
                } else if ey != 0 {
                    self.hline(x, x + b, y, color);
                    exa -= exd;
                } else {
                    self.hline(x - b, x + b, y, color);
                }
                loop {
                    if -a >= ey {
                        self.hline(from_fixed(exa), from_fixed(sxa), y - a, color);
                        sxa -= sxd;
                        exa -= exd;
                    } else if -a >= sy {
                        self.hline(x - b, from_fixed(sxa), y - a, color);
                        sxa -= sxd;
                    } else if qtr & 1 != 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    if step!() {
                        if -b >= ey {
                            self.hline(from_fixed(exb), from_fixed(sxb), y - b, color);
                            sxb += sxd;
                            exb += exd;
                        } else if -b >= sy {
                            self.hline(x - a, from_fixed(sxb), y - b, color);
                            sxb += sxd;
                        } else if qtr & 1 != 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= ey {
                    self.hline(from_fixed(exa), from_fixed(sxa), y - a, color);
                } else if -a >= sy {
                    self.hline(x - b, from_fixed(sxa), y - a, color);
                } else if qtr & 1 != 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
            }

            2 | 3 | 6 | 7 | 18 | 19 | 22 | 23 => {
                // Start in the bottom half, end in the top right.
                self.hline(x, x + b, y, color);
                sxa += sxd;
                exa -= exd;
                loop {
                    if -a >= ey {
                        self.hline(from_fixed(exa), x + b, y - a, color);
                        exa -= exd;
                    } else if qtr & 4 == 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    if a <= sy {
                        self.hline(from_fixed(sxa), x + b, y + a, color);
                        sxa += sxd;
                    } else if qtr & 1 == 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        if -b >= ey {
                            self.hline(from_fixed(exb), x + a, y - b, color);
                            exb += exd;
                        } else if qtr & 4 == 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        if b <= sy {
                            self.hline(from_fixed(sxb), x + a, y + b, color);
                            sxb -= sxd;
                        } else if qtr & 1 == 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= ey {
                    self.hline(from_fixed(exa), x + b, y - a, color);
                } else if qtr & 4 == 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
                if a <= sy {
                    self.hline(from_fixed(sxa), x + a, y + a, color);
                } else if qtr & 1 == 0 {
                    self.hline(x - b, x + a, y + a, color);
                }
            }

            4 | 5 => {
                // Start in quarter 1 or 2, end in quarter 1, start below end.
                self.hline(x - b, x + b, y, color);
                loop {
                    if -a >= ey {
                        self.hline(x - b, from_fixed(sxa), y - a, color);
                        self.hline(from_fixed(exa), x + b, y - a, color);
                        sxa -= sxd;
                        exa -= exd;
                    } else if -a >= sy {
                        self.hline(x - b, from_fixed(sxa), y - a, color);
                        sxa -= sxd;
                    } else if qtr & 1 != 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    self.hline(x - b, x + b, y + a, color);
                    if step!() {
                        if -b >= ey {
                            self.hline(x - a, from_fixed(sxb), y - b, color);
                            self.hline(from_fixed(exb), x + a, y - b, color);
                            sxb += sxd;
                            exb += exd;
                        } else if -b >= sy {
                            self.hline(x - a, from_fixed(sxb), y - b, color);
                            sxb += sxd;
                        } else if qtr & 1 != 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        self.hline(x - a, x + a, y + b, color);
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= ey {
                    self.hline(x - b, from_fixed(sxa), y - a, color);
                    self.hline(from_fixed(exa), x + b, y - a, color);
                } else if -a >= sy {
                    self.hline(x - b, from_fixed(sxa), y - a, color);
                } else if qtr & 1 != 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
                self.hline(x - a, x + a, y + b, color);
            }

            8 | 9 | 12 | 13 | 24 | 25 | 28 | 29 => {
                // Start in the top half, end in the bottom left.
                self.hline(x - b, x, y, color);
                sxa -= sxd;
                exa += exd;
                loop {
                    if -a >= sy {
                        self.hline(x - b, from_fixed(sxa), y - a, color);
                        sxa -= sxd;
                    } else if qtr & 1 != 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    if a <= ey {
                        self.hline(x - b, from_fixed(exa), y + a, color);
                        exa += exd;
                    } else if qtr & 4 != 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        if -b >= sy {
                            self.hline(x - a, from_fixed(sxb), y - b, color);
                            sxb += sxd;
                        } else if qtr & 1 != 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        if b <= ey {
                            self.hline(x - a, from_fixed(exb), y + b, color);
                            exb -= exd;
                        } else if qtr & 4 != 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= sy {
                    self.hline(x - b, from_fixed(sxa), y - a, color);
                } else if qtr & 1 != 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
                if a <= ey {
                    self.hline(x - b, from_fixed(exa), y + a, color);
                } else if qtr & 4 != 0 {
                    self.hline(x - b, x + a, y + a, color);
                }
            }

            10 | 14 => {
                // Both lines in the bottom left, start above end.
                self.draw_pixel_clipped(x, y, color);
                sxa += sxd;
                exa += exd;
                loop {
                    if a <= sy {
                        self.hline(from_fixed(sxa), from_fixed(exa), y + a, color);
                        sxa += sxd;
                        exa += exd;
                    } else if a <= ey {
                        self.hline(x - b, from_fixed(exa), y + a, color);
                        exa += exd;
                    } else if qtr & 4 != 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        if b <= sy {
                            self.hline(from_fixed(sxb), from_fixed(exb), y + b, color);
                            sxb -= sxd;
                            exb -= exd;
                        } else if b <= ey {
                            self.hline(x - a, from_fixed(exb), y + b, color);
                            exb -= exd;
                        } else if qtr & 4 != 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if a <= sy {
                    self.hline(from_fixed(sxa), from_fixed(exa), y + a, color);
                } else if a <= ey {
                    self.hline(x - b, from_fixed(exa), y + a, color);
                } else if qtr & 4 != 0 {
                    self.hline(x - b, x + b, y + a, color);
                }
            }

            11 | 15 => {
                // Start in quarter 4, end in the bottom half, wrap through
                // the whole top.
                self.hline(x - b, x + b, y, color);
                loop {
                    self.hline(x - b, x + b, y - a, color);
                    if a <= sy {
                        self.hline(x - b, from_fixed(exa), y + a, color);
                        self.hline(from_fixed(sxa), x + b, y + a, color);
                        sxa += sxd;
                        exa += exd;
                    } else if a <= ey {
                        self.hline(x - b, from_fixed(exa), y + a, color);
                        exa += exd;
                    } else if qtr & 4 != 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        self.hline(x - a, x + a, y - b, color);
                        if b <= sy {
                            self.hline(x - a, from_fixed(exb), y + b, color);
                            self.hline(from_fixed(sxb), x + a, y + b, color);
                            sxb -= sxd;
                            exb -= exd;
                        } else if b <= ey {
                            self.hline(x - a, from_fixed(exb), y + b, color);
                            exb -= exd;
                        } else if qtr & 4 != 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                self.hline(x - b, x + b, y - a, color);
                if a <= sy {
                    self.hline(x - b, from_fixed(exa), y + a, color);
                    self.hline(from_fixed(sxa), x + b, y + a, color);
                } else if a <= ey {
                    self.hline(x - b, from_fixed(exa), y + a, color);
                } else if qtr & 4 != 0 {
                    self.hline(x - b, x + b, y + a, color);
                }
            }

            16 | 20 => {
                // Start in quarter 2, end in the top half, start above end.
                self.hline(x - b, x + b, y, color);
                sxa -= sxd;
                exa -= exd;
                loop {
                    if -a >= sy {
                        self.hline(x - b, from_fixed(sxa), y - a, color);
                        self.hline(from_fixed(exa), x + b, y - a, color);
                        sxa -= sxd;
                        exa -= exd;
                    } else if -a >= ey {
                        self.hline(from_fixed(exa), x + b, y - a, color);
                        exa -= exd;
                    } else if qtr & 4 == 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    self.hline(x - b, x + b, y + a, color);
                    if step!() {
                        if -b >= sy {
                            self.hline(x - a, from_fixed(sxb), y - b, color);
                            self.hline(from_fixed(exb), x + a, y - b, color);
                            sxb += sxd;
                            exb += exd;
                        } else if -b >= ey {
                            self.hline(from_fixed(exb), x + a, y - b, color);
                            exb += exd;
                        } else if qtr & 4 == 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        self.hline(x - a, x + a, y + b, color);
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= sy {
                    self.hline(x - b, from_fixed(sxa), y - a, color);
                    self.hline(from_fixed(exa), x + b, y - a, color);
                } else if -a >= ey {
                    self.hline(from_fixed(exa), x + b, y - a, color);
                } else if qtr & 4 == 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
                self.hline(x - b, x + b, y + a, color);
            }

            17 | 21 => {
                // Both lines in the top right, start above end.
                if sy != 0 {
                    self.hline(x, x, y, color);
                    sxa -= sxd;
                    exa -= exd;
                } else {
                    self.hline(x, x + b, y, color);
                    exa -= exd;
                }
                loop {
                    if -a >= sy {
                        self.hline(from_fixed(exa), from_fixed(sxa), y - a, color);
                        sxa -= sxd;
                        exa -= exd;
                    } else if -a >= ey {
                        self.hline(from_fixed(exa), x + b, y - a, color);
                        exa -= exd;
                    } else if qtr & 4 == 0 {
                        self.hline(x - b, x + b, y - a, color);
                    }
                    if step!() {
                        if -b >= sy {
                            self.hline(from_fixed(exb), from_fixed(sxb), y - b, color);
                            sxb += sxd;
                            exb += exd;
                        } else if -b >= ey {
                            self.hline(from_fixed(exb), x + a, y - b, color);
                            exb += exd;
                        } else if qtr & 4 == 0 {
                            self.hline(x - a, x + a, y - b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if -a >= sy {
                    self.hline(from_fixed(exa), from_fixed(sxa), y - a, color);
                } else if -a >= ey {
                    self.hline(from_fixed(exa), x + b, y - a, color);
                } else if qtr & 4 == 0 {
                    self.hline(x - b, x + b, y - a, color);
                }
            }

            26 | 27 => {
                // Start in the bottom half, end in quarter 3, wrap through
                // the whole top.
                self.hline(x - b, x + b, y, color);
                loop {
                    self.hline(x - b, x + b, y - a, color);
                    if a <= ey {
                        self.hline(x - b, from_fixed(exa), y + a, color);
                        self.hline(from_fixed(sxa), x + b, y + a, color);
                        sxa += sxd;
                        exa += exd;
                    } else if a <= sy {
                        self.hline(from_fixed(sxa), x + b, y + a, color);
                        sxa += sxd;
                    } else if qtr & 1 == 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        self.hline(x - a, x + a, y - b, color);
                        if b <= ey {
                            self.hline(x - a, from_fixed(exb), y + b, color);
                            self.hline(from_fixed(sxb), x + a, y + b, color);
                            sxb -= sxd;
                            exb -= exd;
                        } else if b <= sy {
                            self.hline(from_fixed(sxb), x + a, y + b, color);
                            sxb -= sxd;
                        } else if qtr & 1 == 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                self.hline(x - b, x + b, y - a, color);
                if a <= ey {
                    self.hline(x - b, from_fixed(exa), y + a, color);
                    self.hline(from_fixed(sxa), x + b, y + a, color);
                } else if a <= sy {
                    self.hline(from_fixed(sxa), x + b, y + a, color);
                } else if qtr & 4 == 0 {
                    self.hline(x - b, x + b, y + a, color);
                }
            }

            30 | 31 => {
                // Both lines in the bottom right, start above end.
                loop {
                    if a <= ey {
                        self.hline(from_fixed(sxa), from_fixed(exa), y + a, color);
                        sxa += sxd;
                        exa += exd;
                    } else if a <= sy {
                        self.hline(from_fixed(sxa), x + b, y + a, color);
                        sxa += sxd;
                    } else if qtr & 1 == 0 {
                        self.hline(x - b, x + b, y + a, color);
                    }
                    if step!() {
                        if b <= ey {
                            self.hline(from_fixed(sxb), from_fixed(exb), y + b, color);
                            sxb -= sxd;
                            exb -= exd;
                        } else if b <= sy {
                            self.hline(from_fixed(sxb), x + a, y + b, color);
                            sxb -= sxd;
                        } else if qtr & 1 == 0 {
                            self.hline(x - a, x + a, y + b, color);
                        }
                        step_done!();
                    }
                    if a >= b {
                        break;
                    }
                }
                if a <= ey || a <= sy {
                    self.hline(from_fixed(sxa), x + b, y + a, color);
                } else if qtr & 4 == 0 {
                    self.hline(x - b, x + b, y + a, color);
                }
            }

            _ => {}
        }
    }
}

/// Normalize an angle in degrees to `0..360`.
fn normalize_angle(angle: Coord) -> Coord {
    let a = angle % 360;
    if a < 0 {
        a + 360
    } else {
        a
    }
}

impl Display {
    /// Draw the outline arc of the given 45-degree sectors.
    pub fn draw_arc_sectors(&self, x: Coord, y: Coord, radius: Coord, sectors: u8, color: Color) {
        let mut s = self.lock();
        s.draw_arc_sectors(x, y, radius, sectors, color);
        s.end_paint();
    }

    /// Fill the pie slices of the given 45-degree sectors.
    pub fn fill_arc_sectors(&self, x: Coord, y: Coord, radius: Coord, sectors: u8, color: Color) {
        let mut s = self.lock();
        s.fill_arc_sectors(x, y, radius, sectors, color);
        s.end_paint();
    }

    /// Draw an arc outline counterclockwise from `start` to `end` degrees,
    /// measured from the positive x axis. Equal angles draw a full circle.
    pub fn draw_arc(
        &self,
        x: Coord,
        y: Coord,
        radius: Coord,
        start: Coord,
        end: Coord,
        color: Color,
    ) {
        let mut s = self.lock();
        s.draw_arc(x, y, radius, start, end, color);
        s.end_paint();
    }

    /// Fill the pie slice swept counterclockwise from `start` to `end`
    /// degrees.
    pub fn fill_arc(
        &self,
        x: Coord,
        y: Coord,
        radius: Coord,
        start: Coord,
        end: Coord,
        color: Color,
    ) {
        let mut s = self.lock();
        s.fill_arc(x, y, radius, start, end, color);
        s.end_paint();
    }

    /// Draw the outline of a rectangle with rounded corners. A radius too
    /// large for the rectangle falls back to a plain box.
    pub fn draw_rounded_box(&self, rect: Rect, radius: Coord, color: Color) {
        if 2 * radius > rect.cx || 2 * radius > rect.cy {
            self.draw_box(rect, color);
            return;
        }
        let (x, y, cx, cy) = (rect.x, rect.y, rect.cx, rect.cy);

        let mut s = self.lock();
        s.draw_arc_sectors(x + radius, y + radius, radius, 0x0C, color);
        s.draw_arc_sectors(x + cx - 1 - radius, y + radius, radius, 0x03, color);
        s.draw_arc_sectors(x + cx - 1 - radius, y + cy - 1 - radius, radius, 0xC0, color);
        s.draw_arc_sectors(x + radius, y + cy - 1 - radius, radius, 0x30, color);
        s.line(x + radius + 1, y, x + cx - 2 - radius, y, color);
        s.line(x + cx - 1, y + radius + 1, x + cx - 1, y + cy - 2 - radius, color);
        s.line(x + radius + 1, y + cy - 1, x + cx - 2 - radius, y + cy - 1, color);
        s.line(x, y + radius + 1, x, y + cy - 2 - radius, color);
        s.end_paint();
    }

    /// Fill a rectangle with rounded corners. A radius too large for the
    /// rectangle falls back to a plain fill.
    pub fn fill_rounded_box(&self, rect: Rect, radius: Coord, color: Color) {
        let radius2 = radius * 2;
        if radius2 > rect.cx || radius2 > rect.cy {
            self.fill_area(rect, color);
            return;
        }
        let (x, y, cx, cy) = (rect.x, rect.y, rect.cx, rect.cy);

        let mut s = self.lock();
        s.fill_arc_sectors(x + radius, y + radius, radius, 0x0C, color);
        s.fill_arc_sectors(x + cx - 1 - radius, y + radius, radius, 0x03, color);
        s.fill_arc_sectors(x + cx - 1 - radius, y + cy - 1 - radius, radius, 0xC0, color);
        s.fill_arc_sectors(x + radius, y + cy - 1 - radius, radius, 0x30, color);
        s.fill_area(Rect::new(x + radius + 1, y, cx - radius2, radius), color);
        s.fill_area(Rect::new(x + radius + 1, y + cy - radius, cx - radius2, radius), color);
        s.fill_area(Rect::new(x, y + radius, cx, cy - radius2), color);
        s.end_paint();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::framebuffer_display;

    fn lit(fb: &[Color], w: Coord, color: Color) -> Vec<(Coord, Coord)> {
        fb.iter()
            .enumerate()
            .filter(|(_, &c)| c == color)
            .map(|(i, _)| (i as Coord % w, i as Coord / w))
            .collect()
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(0), 0);
        assert_eq!(normalize_angle(360), 0);
        assert_eq!(normalize_angle(450), 90);
        assert_eq!(normalize_angle(-90), 270);
        assert_eq!(normalize_angle(-360), 0);
        assert_eq!(normalize_angle(-720), 0);
    }

    #[test]
    fn test_draw_sectors_top_right_quadrant_only() {
        let (d, fb) = framebuffer_display(40, 40);
        // Sectors 0 and 1: the quadrant from 0 to 90 degrees.
        d.draw_arc_sectors(20, 20, 10, 0x03, Color::WHITE);
        let fb = fb.lock();
        for (px, py) in lit(&fb, 40, Color::WHITE) {
            assert!(px >= 20 && py <= 20, "pixel {},{} outside quadrant", px, py);
        }
        assert_eq!(fb[20 * 40 + 30], Color::WHITE);
        assert_eq!(fb[10 * 40 + 20], Color::WHITE);
    }

    #[test]
    fn test_draw_all_sectors_matches_circle() {
        let (a, fa) = framebuffer_display(40, 40);
        let (b, fbb) = framebuffer_display(40, 40);
        a.draw_arc_sectors(20, 20, 12, 0xFF, Color::WHITE);
        b.draw_circle(20, 20, 12, Color::WHITE);
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_fill_sectors_half_disc() {
        let (d, fb) = framebuffer_display(40, 40);
        // The whole top half.
        d.fill_arc_sectors(20, 20, 10, 0x0F, Color::RED);
        let fb = fb.lock();
        // Solidly filled above the center line.
        for y in 12..=20 {
            assert_eq!(fb[y * 40 + 20], Color::RED, "hole at 20,{}", y);
        }
        for (px, py) in lit(&fb, 40, Color::RED) {
            assert!(py <= 20, "pixel {},{} below center", px, py);
            let d2 = (px - 20).pow(2) + (py - 20).pow(2);
            assert!(d2 <= 11 * 11, "pixel {},{} outside radius", px, py);
        }
    }

    #[test]
    fn test_fill_arc_quarter() {
        let (d, fb) = framebuffer_display(40, 40);
        // First quadrant pie slice.
        d.fill_arc(20, 20, 10, 0, 90, Color::GREEN);
        let fb = fb.lock();
        assert_eq!(fb[16 * 40 + 24], Color::GREEN);
        for (px, py) in lit(&fb, 40, Color::GREEN) {
            assert!(
                px >= 19 && py <= 20,
                "pixel {},{} outside first quadrant",
                px,
                py
            );
            let d2 = (px - 20).pow(2) + (py - 20).pow(2);
            assert!(d2 <= 11 * 11, "pixel {},{} outside radius", px, py);
        }
    }

    #[test]
    fn test_fill_arc_full_circle() {
        let (d, fb) = framebuffer_display(40, 40);
        d.fill_arc(20, 20, 8, 0, 360, Color::BLUE);
        let fb = fb.lock();
        // Solid everywhere well inside the radius.
        for y in 0..40 {
            for x in 0..40 {
                if (x - 20i32).pow(2) + (y - 20i32).pow(2) <= 36 {
                    assert_eq!(fb[(y * 40 + x) as usize], Color::BLUE, "hole at {},{}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_draw_arc_quarter_span() {
        let (d, fb) = framebuffer_display(40, 40);
        d.draw_arc(20, 20, 10, 0, 90, Color::WHITE);
        let fb = fb.lock();
        let pixels = lit(&fb, 40, Color::WHITE);
        assert!(!pixels.is_empty());
        for (px, py) in pixels {
            assert!(
                px >= 19 && py <= 21,
                "pixel {},{} outside first quadrant",
                px,
                py
            );
            let dist = (((px - 20).pow(2) + (py - 20).pow(2)) as f64).sqrt();
            assert!((dist - 10.0).abs() < 1.5, "pixel {},{} off the arc", px, py);
        }
    }

    #[test]
    fn test_draw_arc_full_matches_circle() {
        let (a, fa) = framebuffer_display(40, 40);
        let (b, fbb) = framebuffer_display(40, 40);
        a.draw_arc(20, 20, 11, 45, 45, Color::WHITE);
        b.draw_circle(20, 20, 11, Color::WHITE);
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_rounded_box_falls_back_when_radius_too_big() {
        let (a, fa) = framebuffer_display(30, 30);
        let (b, fbb) = framebuffer_display(30, 30);
        a.draw_rounded_box(Rect::new(2, 2, 10, 10), 8, Color::WHITE);
        b.draw_box(Rect::new(2, 2, 10, 10), Color::WHITE);
        assert_eq!(*fa.lock(), *fbb.lock());
    }

    #[test]
    fn test_fill_rounded_box_corners_cut() {
        let (d, fb) = framebuffer_display(40, 40);
        d.fill_rounded_box(Rect::new(5, 5, 20, 16), 5, Color::RED);
        let fb = fb.lock();
        // Center is solid, extreme corners are not painted.
        assert_eq!(fb[12 * 40 + 15], Color::RED);
        assert_eq!(fb[5 * 40 + 5], Color::BLACK);
        assert_eq!(fb[5 * 40 + 24], Color::BLACK);
        assert_eq!(fb[20 * 40 + 5], Color::BLACK);
        assert_eq!(fb[20 * 40 + 24], Color::BLACK);
        // Edge midpoints are painted.
        assert_eq!(fb[5 * 40 + 15], Color::RED);
        assert_eq!(fb[20 * 40 + 15], Color::RED);
        assert_eq!(fb[12 * 40 + 5], Color::RED);
        assert_eq!(fb[12 * 40 + 24], Color::RED);
    }
}
