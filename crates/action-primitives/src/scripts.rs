//! Page scripts evaluated through the automation surface.

/// Returns `{ x, y }` for the document scroll offset.
pub const SCROLL_POSITION: &str =
    "(() => ({ x: window.scrollX || window.pageXOffset || 0, y: window.scrollY || window.pageYOffset || 0 }))()";

/// Returns `{ width, height }` of the layout viewport.
pub const VIEWPORT_SIZE: &str =
    "(() => ({ width: window.innerWidth, height: window.innerHeight }))()";

pub const DEVICE_PIXEL_RATIO: &str = "(() => window.devicePixelRatio || 1)()";

/// Scroll the nearest scrollable ancestor of the element under `(x, y)`, or the window.
pub fn scroll_fallback(x: f64, y: f64, delta_x: f64, delta_y: f64) -> String {
    format!(
        "(() => {{
            const dx = {delta_x};
            const dy = {delta_y};
            const canScroll = (el) => {{
                const style = window.getComputedStyle(el);
                const scrollY = /(auto|scroll)/.test(style.overflowY) && el.scrollHeight > el.clientHeight;
                const scrollX = /(auto|scroll)/.test(style.overflowX) && el.scrollWidth > el.clientWidth;
                return (dy !== 0 && scrollY) || (dx !== 0 && scrollX);
            }};
            let el = document.elementFromPoint({x}, {y});
            while (el && el !== document.body && el !== document.documentElement) {{
                if (canScroll(el)) {{
                    el.scrollBy({{ left: dx, top: dy, behavior: 'instant' }});
                    return {{ target: 'element' }};
                }}
                el = el.parentElement;
            }}
            window.scrollBy({{ left: dx, top: dy, behavior: 'instant' }});
            return {{ target: 'window' }};
        }})()"
    )
}
