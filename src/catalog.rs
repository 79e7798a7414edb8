//! Built-in dependency declarations, used when no `stagehand.toml` is present.
//!
//! Order matters: dependencies are installed and built in the order listed,
//! and native packages appear in the generated `CMakeLists.txt` in that order.

use crate::adapter::{BuildStrategy, HeaderSelection, ImplementationUnit};
use crate::dependency::DependencySpec;
use crate::filter::FilterRule;
use crate::native::options;

const STB_HEADERS: [&str; 3] = ["LICENSE", "stb_image.h", "stb_image_write.h"];

const IMGUI_BACKENDS: [&str; 4] = [
    "imgui_impl_sdl3.h",
    "imgui_impl_sdl3.cpp",
    "imgui_impl_vulkan.h",
    "imgui_impl_vulkan.cpp",
];

fn stb() -> DependencySpec {
    DependencySpec::new("stb", "https://github.com/nothings/stb.git")
        .pinned("f58f558c120e9b32c217290b80bad1a0729fbb2c")
        .with_filter(FilterRule::allow(STB_HEADERS))
        .with_strategy(BuildStrategy::HeaderOnly {
            headers: HeaderSelection::Files(STB_HEADERS.iter().map(Into::into).collect()),
            implementation: Some(ImplementationUnit::new(
                "stb_image_implementation.cpp",
                [
                    ("STB_IMAGE_IMPLEMENTATION", "stb_image.h"),
                    ("STB_IMAGE_WRITE_IMPLEMENTATION", "stb_image_write.h"),
                ],
            )),
        })
}

fn imgui() -> DependencySpec {
    DependencySpec::new("imgui", "https://github.com/ocornut/imgui.git")
        .pinned("9a5d5c45f54b1301ea471622eddede70384243af")
        .with_filter(FilterRule::scoped("backends", IMGUI_BACKENDS))
        .with_strategy(BuildStrategy::HeaderOnly {
            headers: HeaderSelection::Tree,
            implementation: None,
        })
}

fn header_directory(name: &str, url: &str, revision: &str, subdirectory: &str) -> DependencySpec {
    DependencySpec::new(name, url)
        .pinned(revision)
        .with_strategy(BuildStrategy::HeaderOnly {
            headers: HeaderSelection::Subdirectory(subdirectory.into()),
            implementation: None,
        })
}

/// The dependency set provisioned for the engine, in install order.
pub fn default_dependencies() -> Vec<DependencySpec> {
    vec![
        stb(),
        imgui(),
        DependencySpec::new("fastgltf", "https://github.com/spnda/fastgltf.git")
            .pinned("0d1b67a28c4950ea2deb796702006dcbe31e02b3")
            .with_strategy(BuildStrategy::NativePackage {
                options: options([
                    ("FASTGLTF_COMPILE_AS_CPP20", true),
                    ("FASTGLTF_USE_64BIT_FLOAT", true),
                ]),
            }),
        DependencySpec::new("fmtlib", "https://github.com/fmtlib/fmt.git")
            .pinned("40626af88bd7df9a5fb80be7b25ac85b122d6c21")
            .with_strategy(BuildStrategy::NativePackage {
                options: options([("FMT_INSTALL", false), ("FMT_TEST", false), ("FMT_DOC", false)]),
            }),
        DependencySpec::new("volk", "https://github.com/zeux/volk.git")
            .pinned("0b17a763ba5643e32da1b2152f8140461b3b7345")
            .with_strategy(BuildStrategy::NativePackage {
                options: Vec::new(),
            }),
        header_directory(
            "VulkanMemoryAllocator",
            "https://github.com/GPUOpen-LibrariesAndSDKs/VulkanMemoryAllocator.git",
            "1d8f600fd424278486eade7ed3e877c99f0846b1",
            "include",
        ),
        DependencySpec::new("SDL", "https://github.com/libsdl-org/SDL.git")
            .pinned("a96677bdf6b4acb84af4ec294e5f60a4e8cbbe03")
            .with_strategy(BuildStrategy::NativePackage {
                options: options([
                    ("SDL_AVX", false),
                    ("SDL_AVX2", false),
                    ("SDL_AVX512F", false),
                    ("SDL_SSE", true),
                    ("SDL_SSE2", true),
                    ("SDL_SSE3", false),
                    ("SDL_SSE4_1", false),
                    ("SDL_SSE4_2", false),
                    ("SDL_MMX", false),
                    ("SDL_ALTIVEC", false),
                    ("SDL_ARMNEON", false),
                    ("SDL_LSX", false),
                    ("SDL_LASX", false),
                    ("SDL_VULKAN", true),
                    ("SDL_STATIC", true),
                    ("SDL_TEST_LIBRARY", false),
                ]),
            }),
        header_directory(
            "robin-map",
            "https://github.com/Tessil/robin-map.git",
            "4ec1bf19c6a96125ea22062f38c2cf5b958e448e",
            "include/tsl",
        ),
        DependencySpec::new("Catch2", "https://github.com/catchorg/Catch2.git")
            .pinned("25319fd3047c6bdcf3c0170e76fa526c77f99ca9"),
        DependencySpec::new("Tracy", "https://github.com/wolfpld/tracy.git")
            .pinned("c556831ddc6fe26d2fce01c14c97205a9dad46d5")
            .with_strategy(BuildStrategy::NativePackage {
                options: options([("TRACY_ENABLE", true), ("TRACY_ON_DEMAND", true)]),
            }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::validate_all;

    #[test]
    fn test_catalog_is_valid_and_pinned() {
        let deps = default_dependencies();
        validate_all(&deps).unwrap();
        assert!(deps.iter().all(|d| d.revision.is_some()));
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<String> = default_dependencies().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [
                "stb",
                "imgui",
                "fastgltf",
                "fmtlib",
                "volk",
                "VulkanMemoryAllocator",
                "SDL",
                "robin-map",
                "Catch2",
                "Tracy"
            ]
        );
    }

    #[test]
    fn test_stb_keeps_only_wanted_headers() {
        let stb = stb();
        assert_eq!(stb.filter, FilterRule::allow(STB_HEADERS));
        assert_eq!(stb.strategy.label(), "header-only");
    }
}
